//! End-to-end tests of the objective and the grid sweep on the cell model

mod objective_tests;
mod sweep_tests;
