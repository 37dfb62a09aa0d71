//! Metered background-removal handler.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;

use cutout_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Credits billed per background removal.
const CREDITS_PER_IMAGE: i64 = 1;

/// Background removal response.
#[derive(Debug, Serialize)]
pub struct RemoveBackgroundResponse {
    /// Result image as a `data:` URI.
    pub image: String,
    /// Credit balance after billing this image.
    pub credits: i64,
}

/// Remove the background from an uploaded image.
///
/// Credits are reserved before the transform is invoked; an account that
/// cannot cover the cost gets a 402 and the transform never runs. A
/// failed transform releases the reservation.
pub async fn remove_background(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<RemoveBackgroundResponse>, ApiError> {
    let clipdrop = state
        .clipdrop
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Background removal not configured".into()))?;

    let (image, file_name) = read_image_field(&mut multipart).await?;

    // Reservation gates the metered call.
    let balance_after = state
        .store
        .reserve_credits(&auth.user_id, CREDITS_PER_IMAGE)?;

    match clipdrop.remove_background(image, &file_name).await {
        Ok(result) => {
            tracing::info!(
                user_id = %auth.user_id,
                credits = balance_after,
                "Background removed"
            );
            Ok(Json(RemoveBackgroundResponse {
                image: format!("data:image/png;base64,{}", BASE64.encode(result)),
                credits: balance_after,
            }))
        }
        Err(e) => {
            // Compensate the reservation; the user was not served.
            let restored = state
                .store
                .release_credits(&auth.user_id, CREDITS_PER_IMAGE);
            if let Err(release_err) = restored {
                tracing::error!(
                    user_id = %auth.user_id,
                    error = %release_err,
                    "Failed to release reserved credits"
                );
            }

            tracing::error!(user_id = %auth.user_id, error = %e, "Background removal failed");
            Err(ApiError::ExternalService("Background removal failed".into()))
        }
    }
}

/// Pull the image bytes out of the multipart body.
async fn read_image_field(multipart: &mut Multipart) -> Result<(Vec<u8>, String), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("image.png").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        if data.is_empty() {
            return Err(ApiError::BadRequest("empty image upload".into()));
        }

        return Ok((data.to_vec(), file_name));
    }

    Err(ApiError::BadRequest("missing image field".into()))
}
