// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, UserRepository},
    models::{
        auth::{Claims, User, PORTAL_AUDIENCE, STAFF_AUDIENCE},
        customer::Customer,
    },
};

const TOKEN_TTL_DAYS: i64 = 7;

/// Gera o hash bcrypt fora do runtime assíncrono.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password_clone = password.to_owned();
    let password_hash_clone = password_hash.to_owned();

    // Executa a verificação em um thread separado
    let is_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

    Ok(is_valid)
}

/// Cliente sem senha do portal responde igual a senha errada, com o mesmo custo de bcrypt.
async fn check_portal_password(password: &str, password_hash: Option<&str>) -> Result<(), AppError> {
    let is_valid = match password_hash {
        Some(password_hash) => verify_password(password, password_hash).await?,
        None => {
            hash_password(password).await?;
            false
        }
    };

    if is_valid { Ok(()) } else { Err(AppError::InvalidCredentials) }
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    customer_repo: CustomerRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, customer_repo: CustomerRepository, jwt_secret: String) -> Self {
        Self { user_repo, customer_repo, jwt_secret }
    }

    // =========================================================================
    //  EQUIPE
    // =========================================================================

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        // Só depois da senha correta, para não revelar quais contas existem
        if !user.is_active {
            return Err(AppError::AccountDisabled);
        }

        tracing::info!("🔑 Login de {} ({})", user.email, user.role);
        self.create_token(user.id, STAFF_AUDIENCE)
    }

    /// Valida o token da equipe e carrega o usuário (precisa estar ativo).
    pub async fn authenticate_staff(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token, STAFF_AUDIENCE)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.is_active {
            return Err(AppError::AccountDisabled);
        }

        Ok(user)
    }

    // =========================================================================
    //  PORTAL DO CLIENTE
    // =========================================================================

    pub async fn login_customer(&self, login: &str, password: &str) -> Result<(String, Customer), AppError> {
        let customer = self.customer_repo.find_by_login(login).await?;
        let password_hash = customer.as_ref().and_then(|c| c.portal_password_hash.as_deref());

        check_portal_password(password, password_hash).await?;
        let customer = customer.ok_or(AppError::InvalidCredentials)?;

        tracing::info!("🔑 Login no portal: {}", customer.customer_code);
        let token = self.create_token(customer.id, PORTAL_AUDIENCE)?;
        Ok((token, customer))
    }

    pub async fn authenticate_customer(&self, token: &str) -> Result<Customer, AppError> {
        let claims = self.decode_token(token, PORTAL_AUDIENCE)?;

        let customer = self
            .customer_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        // Acesso revogado depois da emissão do token
        if !customer.has_portal_access() {
            return Err(AppError::PortalAccessDisabled);
        }

        Ok(customer)
    }

    // =========================================================================
    //  TOKENS
    // =========================================================================

    fn decode_token(&self, token: &str, audience: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.set_audience(&[audience]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }

    fn create_token(&self, subject: Uuid, audience: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: subject,
            aud: audience.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    // Pool preguiçoso: nenhuma conexão é aberta enquanto só mexemos com tokens
    fn service() -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            CustomerRepository::new(pool),
            "segredo-de-teste".into(),
        )
    }

    #[tokio::test]
    async fn token_round_trips_within_its_audience() {
        let svc = service();
        let id = Uuid::new_v4();
        let token = svc.create_token(id, STAFF_AUDIENCE).unwrap();

        let claims = svc.decode_token(&token, STAFF_AUDIENCE).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.aud, STAFF_AUDIENCE);
    }

    #[tokio::test]
    async fn staff_token_is_rejected_by_the_portal() {
        let svc = service();
        let token = svc.create_token(Uuid::new_v4(), STAFF_AUDIENCE).unwrap();

        assert!(matches!(
            svc.decode_token(&token, PORTAL_AUDIENCE),
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_invalid() {
        let svc = service();
        let mut other = service();
        other.jwt_secret = "outro-segredo".into();
        let token = other.create_token(Uuid::new_v4(), STAFF_AUDIENCE).unwrap();

        assert!(matches!(
            svc.decode_token(&token, STAFF_AUDIENCE),
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn portal_login_without_access_looks_like_wrong_password() {
        let hashed = hash_password("s3nha-forte").await.unwrap();

        assert!(check_portal_password("s3nha-forte", Some(&hashed)).await.is_ok());
        assert!(matches!(
            check_portal_password("errada", Some(&hashed)).await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            check_portal_password("s3nha-forte", None).await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hashed = hash_password("s3nha-forte").await.unwrap();
        assert!(verify_password("s3nha-forte", &hashed).await.unwrap());
        assert!(!verify_password("errada", &hashed).await.unwrap());
    }
}
