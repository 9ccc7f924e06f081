mod requests;
mod session;
mod tokens;

pub use requests::{
    AuthRequest, CommandRequest, CommandResponse, HealthResponse, MessageResponse, TokenQuery,
    TokenResponse, VehiclesRequest, VerifyRequest,
};
pub use session::{MfaMethod, SessionCheckpoint};
pub use tokens::{ApiToken, TokenPair};
