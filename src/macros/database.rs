/// log a failed diesel call under `$target` and classify the error for the store
macro_rules! db_handle_error {
    ( $data:expr, $target:expr, $type_str:expr ) => {
        match $data {
            Ok(value) => Ok(value),
            Err(error) => {
                error!(target: $target, "Error {}. (error: {})", $type_str, error);
                Err(classify(error))
            }
        }
    };
}

pub(crate) use db_handle_error;
