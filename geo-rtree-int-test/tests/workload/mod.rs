//! Long mixed workloads checked against a brute-force model.

mod mixed_workload_test;
