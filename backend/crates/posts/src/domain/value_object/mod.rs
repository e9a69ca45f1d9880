pub mod outcome;
pub mod page;
pub mod post_sort;
pub mod post_status;
