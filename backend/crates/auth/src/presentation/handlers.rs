//! HTTP Handlers

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use kernel::id::UserId;
use platform::storage::BlobStore;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    GetProfileUseCase, IdDocumentInput, LoginInput, LoginUseCase, ReadIdDocumentUseCase,
    RegisterInput, RegisterUseCase, UploadIdDocumentUseCase, VerifyAddressUseCase,
};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_role::UserRole;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    IdDocumentResponse, LoginRequest, ProfileResponse, RegisterRequest, TokenResponse,
};
use crate::presentation::middleware::AuthUser;

/// Multipart field carrying the ID document scan
pub const ID_DOCUMENT_FIELD: &str = "idPic";

/// Shared state for `/users` handlers
pub struct AuthAppState<R, B>
where
    R: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    /// Private store for ID document scans
    pub id_documents: Arc<B>,
    pub config: Arc<AuthConfig>,
}

impl<R, B> Clone for AuthAppState<R, B>
where
    R: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            id_documents: self.id_documents.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Register / Login
// ============================================================================

/// POST /users/register
pub async fn register<R, B>(
    State(state): State<AuthAppState<R, B>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(state.repo.clone(), state.config.clone());

    let input = RegisterInput {
        email: req.email,
        password: req.password,
        first_name: req.first_name,
        last_name: req.last_name,
        city: req.city,
        address: req.address,
    };

    let output = use_case.execute(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token: output.token.token,
            id: output.user_id,
            expires_at_ms: output.token.expires_at_ms,
        }),
    ))
}

/// POST /users/login
pub async fn login<R, B>(
    State(state): State<AuthAppState<R, B>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<TokenResponse>>
where
    R: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(TokenResponse {
        token: output.token.token,
        id: output.user_id,
        expires_at_ms: output.token.expires_at_ms,
    }))
}

// ============================================================================
// Profile
// ============================================================================

/// GET /users/me
pub async fn me<R, B>(
    State(state): State<AuthAppState<R, B>>,
    caller: AuthUser,
) -> AuthResult<Json<ProfileResponse>>
where
    R: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
{
    let user = GetProfileUseCase::new(state.repo.clone())
        .execute(&caller.user_id)
        .await?;

    Ok(Json(user.into()))
}

/// GET /users/profile-pic/{id}
pub async fn profile_pic<R, B>(
    State(state): State<AuthAppState<R, B>>,
    Path(id): Path<String>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
{
    // Parsing also rules out path traversal
    let user_id = UserId::parse(&id).ok_or(AuthError::ProfilePictureNotFound)?;
    let path = state.config.profile_pic_dir.join(format!("{}.png", user_id));

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AuthError::ProfilePictureNotFound,
        _ => AuthError::Internal(format!("Failed to read profile picture: {}", e)),
    })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}

// ============================================================================
// Address verification
// ============================================================================

/// POST /users/register/id
pub async fn upload_id_document<R, B>(
    State(state): State<AuthAppState<R, B>>,
    caller: AuthUser,
    mut multipart: Multipart,
) -> AuthResult<Json<IdDocumentResponse>>
where
    R: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
{
    let mut document = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AuthError::Validation(e.body_text()))?
    {
        if field.name() != Some(ID_DOCUMENT_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("document").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AuthError::Validation(e.body_text()))?;
        document = Some(IdDocumentInput { file_name, bytes });
        break;
    }

    let input = document.ok_or_else(|| {
        AuthError::Validation(format!("Missing multipart field '{}'", ID_DOCUMENT_FIELD))
    })?;

    let use_case = UploadIdDocumentUseCase::new(state.repo.clone(), state.id_documents.clone());
    let id_url = use_case.execute(&caller.user_id, input).await?;

    Ok(Json(IdDocumentResponse { id_url }))
}

/// GET /users/id-documents/{key}
pub async fn id_document<R, B>(
    State(state): State<AuthAppState<R, B>>,
    caller: AuthUser,
    Path(key): Path<String>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
{
    caller.require_role(UserRole::Moderator)?;

    let document = ReadIdDocumentUseCase::new(state.id_documents.clone())
        .execute(&key)
        .await?;

    tracing::info!(moderator = %caller.user_id, key = %key, "ID document viewed");
    Ok((
        [
            (header::CONTENT_TYPE, document.content_type),
            (header::CACHE_CONTROL, "private, no-store".to_string()),
        ],
        document.bytes,
    ))
}

/// PUT /users/verify/{id}
pub async fn verify_address<R, B>(
    State(state): State<AuthAppState<R, B>>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
{
    caller.require_role(UserRole::Moderator)?;
    let user_id = UserId::parse(&id).ok_or(AuthError::UserNotFound)?;

    VerifyAddressUseCase::new(state.repo.clone())
        .execute(&caller.user_id, &user_id)
        .await?;

    Ok(StatusCode::OK)
}
