use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::domain::{normalize_email, LoginInput, PublicUser, RegisterInput, UserRecord};
use super::errors::UserError;
use super::repository::UserRepository;

const REGISTER_REQUIRED: &str = "name, email, password required";
const LOGIN_REQUIRED: &str = "email, password required";
const LOOKUP_REQUIRED: &str = "email query required";

/// A field counts as missing when absent or empty. Whitespace is kept as-is.
fn present(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

/// User business service independent of web framework
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self { Self { repo } }

    /// Register a new account. Passwords are stored as given.
    ///
    /// # Examples
    /// ```
    /// use service::users::{UserService, repository::mock::MemoryUserRepository};
    /// use service::users::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let svc = UserService::new(Arc::new(MemoryUserRepository::default()));
    /// let input = RegisterInput { name: Some("Ann".into()), email: Some("Ann@Example.com".into()), password: Some("pw".into()) };
    /// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    /// let user = rt.block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "ann@example.com");
    /// ```
    #[instrument(skip_all)]
    pub async fn register(&self, input: RegisterInput) -> Result<PublicUser, UserError> {
        let (name, email, password) =
            match (present(input.name), present(input.email), present(input.password)) {
                (Some(n), Some(e), Some(p)) => (n, e, p),
                _ => return Err(UserError::Validation(REGISTER_REQUIRED.into())),
            };
        let record = UserRecord { name, email: normalize_email(&email), password };
        let user = record.public();
        if !self.repo.insert_if_absent(record).await? {
            debug!(email = %user.email, "email already registered");
            return Err(UserError::DuplicateEmail);
        }
        info!(email = %user.email, "user_registered");
        Ok(user)
    }

    /// Check credentials. Unknown email and wrong password are indistinguishable.
    #[instrument(skip_all)]
    pub async fn login(&self, input: LoginInput) -> Result<PublicUser, UserError> {
        let (email, password) = match (present(input.email), present(input.password)) {
            (Some(e), Some(p)) => (normalize_email(&e), p),
            _ => return Err(UserError::Validation(LOGIN_REQUIRED.into())),
        };
        match self.repo.find(&email).await? {
            Some(user) if user.password == password => {
                info!(email = %user.email, "user_logged_in");
                Ok(user.public())
            }
            _ => {
                debug!(%email, "login rejected");
                Err(UserError::InvalidCredentials)
            }
        }
    }

    pub async fn lookup(&self, email: &str) -> Result<PublicUser, UserError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(UserError::Validation(LOOKUP_REQUIRED.into()));
        }
        self.repo
            .find(&email)
            .await?
            .map(|u| u.public())
            .ok_or(UserError::NotFound)
    }

    /// Every account without passwords.
    pub async fn list_public(&self) -> Result<Vec<PublicUser>, UserError> {
        let users = self.repo.list().await?;
        Ok(users.iter().map(UserRecord::public).collect())
    }

    pub async fn flush(&self) -> Result<(), UserError> {
        self.repo.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repository::mock::MemoryUserRepository;

    fn svc() -> UserService {
        UserService::new(Arc::new(MemoryUserRepository::default()))
    }

    fn reg(name: &str, email: &str, password: &str) -> RegisterInput {
        RegisterInput {
            name: Some(name.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    fn login(email: &str, password: &str) -> LoginInput {
        LoginInput { email: Some(email.into()), password: Some(password.into()) }
    }

    #[tokio::test]
    async fn register_then_login_returns_same_user() -> Result<(), anyhow::Error> {
        let s = svc();
        let registered = s.register(reg("Ann", "Ann@X.com", "secret")).await?;
        assert_eq!(registered, PublicUser { name: "Ann".into(), email: "ann@x.com".into() });

        let logged_in = s.login(login("ANN@x.com", "secret")).await?;
        assert_eq!(logged_in, registered);
        Ok(())
    }

    #[tokio::test]
    async fn second_registration_with_other_case_conflicts() -> Result<(), anyhow::Error> {
        let s = svc();
        s.register(reg("A", "A@x.com", "1")).await?;
        let err = s.register(reg("B", "a@x.com", "2")).await.unwrap_err();
        assert!(matches!(err, UserError::DuplicateEmail));
        assert_eq!(err.code(), 1002);
        Ok(())
    }

    #[tokio::test]
    async fn missing_or_empty_fields_fail_validation_without_insert() -> Result<(), anyhow::Error> {
        let s = svc();
        let no_name = RegisterInput { name: None, email: Some("a@x.com".into()), password: Some("p".into()) };
        let err = s.register(no_name).await.unwrap_err();
        assert!(matches!(&err, UserError::Validation(m) if m == REGISTER_REQUIRED));

        let empty_pw = reg("A", "a@x.com", "");
        assert!(matches!(s.register(empty_pw).await, Err(UserError::Validation(_))));

        assert!(s.list_public().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_both_invalid_credentials() -> Result<(), anyhow::Error> {
        let s = svc();
        s.register(reg("A", "a@x.com", "right")).await?;

        let wrong = s.login(login("a@x.com", "wrong")).await.unwrap_err();
        assert!(matches!(wrong, UserError::InvalidCredentials));

        let unknown = s.login(login("ghost@x.com", "right")).await.unwrap_err();
        assert!(matches!(unknown, UserError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
        Ok(())
    }

    #[tokio::test]
    async fn password_comparison_is_exact() -> Result<(), anyhow::Error> {
        let s = svc();
        s.register(reg("A", "a@x.com", "Secret")).await?;
        assert!(s.login(login("a@x.com", "secret")).await.is_err());
        assert!(s.login(login("a@x.com", "Secret ")).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let s = svc();
        let err = s.login(LoginInput { email: Some("a@x.com".into()), password: None }).await.unwrap_err();
        assert!(matches!(&err, UserError::Validation(m) if m == LOGIN_REQUIRED));
    }

    #[tokio::test]
    async fn lookup_paths() -> Result<(), anyhow::Error> {
        let s = svc();
        s.register(reg("Cy", "cy@x.com", "pw")).await?;

        let found = s.lookup("CY@X.COM").await?;
        assert_eq!(found.name, "Cy");

        assert!(matches!(s.lookup("nobody@x.com").await, Err(UserError::NotFound)));
        assert!(matches!(s.lookup("").await, Err(UserError::Validation(m)) if m == LOOKUP_REQUIRED));
        Ok(())
    }

    #[tokio::test]
    async fn list_public_hides_passwords() -> Result<(), anyhow::Error> {
        let s = svc();
        s.register(reg("A", "a@x.com", "p1")).await?;
        s.register(reg("B", "b@x.com", "p2")).await?;
        let mut users = s.list_public().await?;
        users.sort_by(|a, b| a.email.cmp(&b.email));
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].email, "a@x.com");
        let v = serde_json::to_value(&users)?;
        assert!(!v.to_string().contains("p1"));
        Ok(())
    }
}
