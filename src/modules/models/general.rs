use diesel::pg::PgConnection;
use diesel::Connection;
use log::error;

use crate::modules::store::{ConnectionSnafu, StoreResult};

/// # connect to the database
///
/// ## Arguments
/// * `database_url` - postgres connection string
///
/// ## Returns
/// * `PgConnection` - an open connection
pub fn establish_connection(database_url: &str) -> StoreResult<PgConnection> {
    match PgConnection::establish(database_url) {
        Ok(conn) => Ok(conn),
        Err(error) => {
            error!(target: "models/general:establish_connection", "Error connecting to database: {}", error);
            ConnectionSnafu { message: error.to_string() }.fail()
        }
    }
}
