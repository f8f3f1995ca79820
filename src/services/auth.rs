// src/services/auth.rs

use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::Claims};

#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    /// Devolve o ID do usuário (`sub`) de um token válido e não expirado.
    pub fn validate_token(&self, token: &str) -> Result<Uuid, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims.sub)
    }

    // Só os testes emitem tokens
    #[cfg(test)]
    pub(crate) fn issue_token(&self, user_id: Uuid) -> String {
        use chrono::Utc;
        use jsonwebtoken::{encode, EncodingKey, Header};

        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            exp: (now + chrono::Duration::days(7)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .unwrap()
    }
}
