//! Stage classification tests.

mod classifier_test;
