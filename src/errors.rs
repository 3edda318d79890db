use validator::ValidationErrors;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Not found")]
    NotFound,
    #[fail(display = "Parse error")]
    Parse,
    #[fail(display = "Validation error: {}", _0)]
    Validate(ValidationErrors),
    #[fail(display = "Server is refusing to fullfil the request")]
    Forbidden,
    #[fail(display = "Authentication required")]
    Unauthorized,
    #[fail(display = "Method not supported")]
    NotSupported,
    #[fail(display = "R2D2 connection error")]
    Connection,
}
