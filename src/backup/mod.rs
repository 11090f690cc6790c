pub mod backup_config;
pub mod compress;
pub mod copy;
pub mod finish;
pub mod format;
pub mod result_error;
pub mod retention;
pub mod tar;
pub mod validate;
pub mod walk;

macro_rules! function_path {
    () => {
        concat!(module_path!(), "::", function_name!(), " ", file!(), ":", line!())
    };
}

pub(crate) use function_path;
