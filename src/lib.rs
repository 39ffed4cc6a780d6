// funnel-console - operator console for the mock traffic-funnel controller
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
