pub mod visit_day;
pub mod visiter;
