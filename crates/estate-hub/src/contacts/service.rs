use std::sync::Arc;

use crate::clock::Clock;
use crate::domain::{ContactAgent, ContactId, NewContactAgent, PropertyId, UserId};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{
    ContactRepository, ContactScope, PropertyRepository, Repositories, RepositoryError,
    UserRepository,
};

/// Buyer-to-agent inquiries about a listing.
pub struct ContactService {
    contacts: Arc<dyn ContactRepository>,
    users: Arc<dyn UserRepository>,
    properties: Arc<dyn PropertyRepository>,
    clock: Arc<dyn Clock>,
}

impl ContactService {
    pub fn new(repositories: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            contacts: repositories.contacts.clone(),
            users: repositories.users.clone(),
            properties: repositories.properties.clone(),
            clock,
        }
    }

    pub fn create(&self, inquiry: NewContactAgent) -> ServiceResult<ContactAgent> {
        self.require_user(inquiry.user_id)?;
        self.require_property(inquiry.property_id)?;
        for (field, value) in [
            ("subject", &inquiry.subject),
            ("message", &inquiry.message),
            ("senderName", &inquiry.sender_name),
            ("senderEmail", &inquiry.sender_email),
        ] {
            if value.trim().is_empty() {
                return Err(ServiceError::InvalidArgument(format!("{field} must not be blank")));
            }
        }
        let contact = self.contacts.insert(inquiry)?;
        tracing::info!(
            contact_id = contact.id,
            property_id = contact.property_id,
            "agent inquiry received"
        );
        Ok(contact)
    }

    pub fn get(&self, id: ContactId) -> ServiceResult<ContactAgent> {
        self.contacts
            .find(id)?
            .ok_or_else(|| ServiceError::not_found("contact", id))
    }

    pub fn for_property(&self, property_id: PropertyId) -> ServiceResult<Vec<ContactAgent>> {
        self.require_property(property_id)?;
        Ok(self.contacts.list(ContactScope::Property(property_id), false)?)
    }

    pub fn for_user(&self, user_id: UserId) -> ServiceResult<Vec<ContactAgent>> {
        self.require_user(user_id)?;
        Ok(self.contacts.list(ContactScope::User(user_id), false)?)
    }

    /// Inquiries across every property the owner lists.
    pub fn for_owner(&self, owner_id: UserId) -> ServiceResult<Vec<ContactAgent>> {
        self.require_user(owner_id)?;
        Ok(self.contacts.list(ContactScope::Owner(owner_id), false)?)
    }

    pub fn unread(&self) -> ServiceResult<Vec<ContactAgent>> {
        Ok(self.contacts.list(ContactScope::All, true)?)
    }

    pub fn unread_for_owner(&self, owner_id: UserId) -> ServiceResult<Vec<ContactAgent>> {
        self.require_user(owner_id)?;
        Ok(self.contacts.list(ContactScope::Owner(owner_id), true)?)
    }

    pub fn unread_count_for_owner(&self, owner_id: UserId) -> ServiceResult<u64> {
        self.require_user(owner_id)?;
        Ok(self.contacts.count_unread_for_owner(owner_id)?)
    }

    /// Marks the inquiry read and stamps the response time.
    pub fn mark_read(&self, id: ContactId) -> ServiceResult<ContactAgent> {
        self.contacts
            .mark_read(id, self.clock.now())
            .map_err(|err| match err {
                RepositoryError::NotFound => ServiceError::not_found("contact", id),
                other => other.into(),
            })
    }

    pub fn delete(&self, id: ContactId) -> ServiceResult<()> {
        if !self.contacts.delete(id)? {
            return Err(ServiceError::not_found("contact", id));
        }
        Ok(())
    }

    fn require_user(&self, id: UserId) -> ServiceResult<()> {
        match self.users.find(id)? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("user", id)),
        }
    }

    fn require_property(&self, id: PropertyId) -> ServiceResult<()> {
        match self.properties.find(id)? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("property", id)),
        }
    }
}
