pub mod dynamic_connectivity;
pub mod euler_tour_tree;
pub mod lists;
pub mod monoid;
pub use dynamic_connectivity::{DynamicConnectivity, DynamicConnectivitySolver, Error};
pub use monoid::MonoidOperator;
