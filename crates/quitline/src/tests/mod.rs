//! Test suites for the lifecycle drivers and the SCM bridge.

mod support;
