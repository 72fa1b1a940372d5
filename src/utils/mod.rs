pub mod email_filter;
pub mod employee_cache;
pub mod logging;
