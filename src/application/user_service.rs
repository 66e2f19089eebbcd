use std::sync::Arc;

use uuid::Uuid;

use crate::domain::criteria::ListQuery;
use crate::domain::errors::DomainError;
use crate::domain::events::{DomainEvent, EventDispatcher};
use crate::domain::ports::UserRepository;
use crate::domain::sale::ListResult;
use crate::domain::user::{User, UserInput};
use crate::domain::validation::validate_user;

pub struct UserService {
    repo: Arc<dyn UserRepository>,
    events: Arc<EventDispatcher>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, events: Arc<EventDispatcher>) -> Self {
        Self { repo, events }
    }

    pub fn create_user(&self, input: UserInput) -> Result<User, DomainError> {
        validate_user(&input)?;
        let user = self.repo.create(input)?;
        self.events.dispatch(&DomainEvent::user_registered(&user));
        Ok(user)
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        self.repo.find_by_id(id)
    }

    pub fn update_user(&self, id: Uuid, input: UserInput) -> Result<User, DomainError> {
        validate_user(&input)?;
        let user = self
            .repo
            .update(id, input)?
            .ok_or(DomainError::NotFound("User"))?;
        self.events.dispatch(&DomainEvent::user_updated(&user));
        Ok(user)
    }

    pub fn delete_user(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete(id)? {
            return Err(DomainError::NotFound("User"));
        }
        self.events.dispatch(&DomainEvent::UserDeleted { user_id: id });
        Ok(())
    }

    pub fn list_users(&self, query: &ListQuery) -> Result<ListResult<User>, DomainError> {
        self.repo.list(query)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::events::EventKind;
    use crate::domain::user::{UserRole, UserStatus};
    use crate::infrastructure::memory::InMemoryUserRepository;

    fn input(username: &str) -> UserInput {
        UserInput {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            phone: "+551133334444".to_string(),
            first_name: "Ana".to_string(),
            last_name: String::new(),
            status: UserStatus::Active,
            role: UserRole::Customer,
            address: None,
        }
    }

    fn service() -> (UserService, Arc<Mutex<Vec<DomainEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        for kind in [EventKind::UserRegistered, EventKind::UserUpdated, EventKind::UserDeleted] {
            let seen = Arc::clone(&seen);
            dispatcher.register(kind, move |e| seen.lock().unwrap().push(e.clone()));
        }
        let service = UserService::new(Arc::new(InMemoryUserRepository::new()), Arc::new(dispatcher));
        (service, seen)
    }

    #[test]
    fn user_lifecycle_raises_events() {
        let (s, seen) = service();
        let user = s.create_user(input("ana")).unwrap();

        let mut changed = input("ana.maria");
        changed.status = UserStatus::Suspended;
        let updated = s.update_user(user.id, changed).unwrap();
        assert_eq!(updated.status, UserStatus::Suspended);

        s.delete_user(user.id).unwrap();
        assert!(s.get_user(user.id).unwrap().is_none());

        let kinds: Vec<EventKind> = seen.lock().unwrap().iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![EventKind::UserRegistered, EventKind::UserUpdated, EventKind::UserDeleted]
        );
    }

    #[test]
    fn invalid_user_raises_nothing() {
        let (s, seen) = service();
        let mut bad = input("ana");
        bad.email = "nope".to_string();
        assert!(matches!(s.create_user(bad), Err(DomainError::InvalidInput(_))));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn deleting_unknown_user_is_not_found_and_silent() {
        let (s, seen) = service();
        assert!(matches!(s.delete_user(Uuid::new_v4()), Err(DomainError::NotFound("User"))));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn list_orders_by_username() {
        let (s, _) = service();
        for name in ["carla", "ana", "bia"] {
            s.create_user(input(name)).unwrap();
        }
        let mut query = ListQuery::paged(1, 10);
        query.order = crate::domain::criteria::parse_order("username");
        let names: Vec<String> = s
            .list_users(&query)
            .unwrap()
            .items
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["ana", "bia", "carla"]);
    }
}
