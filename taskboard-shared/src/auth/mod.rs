/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: dual-secret access/refresh token issuance and validation
/// - [`middleware`]: bearer-token extraction and role gating for axum
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Tokens**: HS256 signing, independent secret and lifetime per kind
/// - **Constant-time Comparison**: verification never short-circuits on
///   partial matches

pub mod jwt;
pub mod middleware;
pub mod password;
