use axum::extract::multipart::Field;
use axum::extract::Multipart;
use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::account::models::MediaFile;
use crate::account::models::RegisterUserCommand;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<ApiSuccess<UserData>, ApiError> {
    let command = RegistrationForm::read(multipart).await?.into_command()?;

    state
        .account_service
        .register(command)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::CREATED, user.into()))
}

/// Raw multipart registration fields, before validation.
#[derive(Debug, Default)]
struct RegistrationForm {
    full_name: String,
    user_name: String,
    email: String,
    password: String,
    avatar: Option<MediaFile>,
    cover_image: Option<MediaFile>,
}

impl RegistrationForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "fullName" => form.full_name = field.text().await.map_err(bad_multipart)?,
                "userName" => form.user_name = field.text().await.map_err(bad_multipart)?,
                "email" => form.email = field.text().await.map_err(bad_multipart)?,
                "password" => form.password = field.text().await.map_err(bad_multipart)?,
                "avatar" => form.avatar = Some(read_file(field).await?),
                "coverImage" => form.cover_image = Some(read_file(field).await?),
                other => tracing::debug!(field = other, "Ignoring unknown registration field"),
            }
        }

        Ok(form)
    }

    fn into_command(self) -> Result<RegisterUserCommand, ApiError> {
        Ok(RegisterUserCommand::new(
            self.full_name,
            self.user_name,
            self.email,
            self.password,
        )?
        .with_avatar(self.avatar)
        .with_cover_image(self.cover_image))
    }
}

async fn read_file(field: Field<'_>) -> Result<MediaFile, ApiError> {
    let file_name = field
        .file_name()
        .or(field.name())
        .unwrap_or("upload")
        .to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(bad_multipart)?;

    Ok(MediaFile::new(file_name, content_type, bytes.to_vec()))
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Malformed multipart body: {}", e))
}
