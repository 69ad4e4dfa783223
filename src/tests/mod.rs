mod support;

mod cases_repartition_test;
