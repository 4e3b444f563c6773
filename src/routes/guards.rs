use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;

use crate::modules::models::competitor::Identity;
use crate::routes::state::AppState;

/// display name set by the identity provider
pub const NAME_HEADER: &str = "X-Competitor-Name";
/// contact address set by the identity provider
pub const EMAIL_HEADER: &str = "X-Competitor-Email";

#[derive(Debug)]
pub struct MissingIdentity;

fn header<'a>(request: &'a Request<'_>, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get_one(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// # identity guard
/// the competitor is trusted as given by the identity provider headers.
/// administrators are recognised by their contact address.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for Identity {
    type Error = MissingIdentity;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let name = match header(request, NAME_HEADER) {
            Some(name) => name,
            None => return Outcome::Error((Status::Unauthorized, MissingIdentity)),
        };

        let admin_email = request
            .rocket()
            .state::<AppState>()
            .and_then(|state| state.settings.admin_email.as_deref());

        Outcome::Success(Identity::new(name, header(request, EMAIL_HEADER)).with_admin_email(admin_email))
    }
}
