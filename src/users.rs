/// User Directory
///
/// A flat in-memory list of users, unique by name, looked up by id or name.
/// Like the session registry it has no internal lock.

use serde::Serialize;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::error::{AppError, AuthError, UserError};
use crate::repository::Repository;
use crate::validators::{is_valid_name, is_valid_password};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub is_admin: bool,
    #[serde(skip)]
    pub password_hash: String,
}

impl User {
    /// Validate the input and hash the password. Touches no directory, so
    /// callers can run it before taking the directory lock.
    ///
    /// # Errors
    /// - `Validation` for an empty/oversized name or password
    /// - `Internal` if hashing fails
    pub fn new(
        name: &str,
        password: &str,
        is_admin: bool,
        bcrypt_cost: u32,
    ) -> Result<Self, AppError> {
        let name = is_valid_name(name)?;
        is_valid_password(password)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            is_admin,
            password_hash: hash_password(password, bcrypt_cost)?,
        })
    }

    /// # Errors
    /// `Auth(InvalidCredentials)` if `candidate` does not match
    pub fn check_password(&self, candidate: &str) -> Result<(), AppError> {
        if verify_password(candidate, &self.password_hash)? {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials.into())
        }
    }
}

pub struct UserDirectory {
    users: Repository<String, User>,
    bcrypt_cost: u32,
}

impl UserDirectory {
    pub fn new(bcrypt_cost: u32) -> Self {
        Self {
            users: Repository::new(|user: &User| user.id.clone()),
            bcrypt_cost,
        }
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    /// Build and store a new user in one step.
    ///
    /// # Errors
    /// See [`User::new`] and [`UserDirectory::insert`]
    pub fn create_user(
        &mut self,
        name: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, AppError> {
        let user = User::new(name, password, is_admin, self.bcrypt_cost)?;
        self.insert(user)
    }

    /// Store a user built with [`User::new`].
    ///
    /// # Errors
    /// `User(AlreadyExists)` if the name is taken
    pub fn insert(&mut self, user: User) -> Result<User, AppError> {
        if self.users.find(|stored| stored.name == user.name).is_some() {
            return Err(UserError::AlreadyExists(user.name).into());
        }

        let stored = self
            .users
            .insert(user)
            .map_err(|_| AppError::Internal("user id collision".to_string()))?;

        tracing::info!(
            user_id = %stored.id,
            name = %stored.name,
            is_admin = stored.is_admin,
            "User created"
        );
        Ok(stored.clone())
    }

    pub fn get_by_id(&self, id: &str) -> Result<&User, UserError> {
        self.users.get(&id.to_string()).ok_or(UserError::NotFound)
    }

    pub fn get_by_name(&self, name: &str) -> Result<&User, UserError> {
        self.users
            .find(|user| user.name == name)
            .ok_or(UserError::NotFound)
    }

    /// Users sorted by name
    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        users
    }

    pub fn delete(&mut self, id: &str) -> Result<User, UserError> {
        self.users.remove(&id.to_string()).ok_or(UserError::NotFound)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
