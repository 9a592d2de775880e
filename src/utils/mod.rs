pub mod exec;
pub mod fs;
pub mod machine_output;
pub mod remote;
pub mod sanitize;
pub mod scan;
