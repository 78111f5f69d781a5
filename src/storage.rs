use chrono::Utc;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CrmError, CrmResult};
use crate::models::{
    Activity, ActivityData, ActivityWithRelations, AgentData, Entity, LeadData, Message,
    MessageData, PropertyData, Record, User, UserData,
};

/// Document store for the CRM collections.
///
/// One Sled tree per collection, keyed by the record UUID, holding the
/// record as a JSON document. Users additionally keep two index trees
/// (`usernames`, `user_emails`) mapping the unique value to the user id.
#[derive(Clone)] // Sled handles are cheap to clone and thread-safe
pub struct Store {
    db: Db,
    usernames: sled::Tree,
    user_emails: sled::Tree,
}

/// Filters accepted by [`Store::list`].
#[derive(Debug, Clone)]
pub struct ListFilter {
    pub status: Option<String>,
    pub search: Option<String>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            offset: 0,
            limit: 50,
        }
    }
}

impl Store {
    /// Open or create the Sled database at the given path.
    pub fn open(path: impl AsRef<Path>) -> CrmResult<Self> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        let usernames = db.open_tree("usernames")?;
        let user_emails = db.open_tree("user_emails")?;
        info!(path = %path.display(), "opened document store");
        Ok(Self {
            db,
            usernames,
            user_emails,
        })
    }

    fn tree<T: Entity>(&self) -> CrmResult<sled::Tree> {
        Ok(self.db.open_tree(T::COLLECTION)?)
    }

    /// Stores validated data under a fresh id and returns the record.
    pub fn insert<T: Entity>(&self, data: T) -> CrmResult<Record<T>> {
        let now = Utc::now();
        let record = Record {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            data,
        };
        self.tree::<T>()?
            .insert(record.id.as_bytes(), serde_json::to_vec(&record)?)?;
        debug!(collection = T::COLLECTION, id = %record.id, "inserted record");
        Ok(record)
    }

    pub fn get<T: Entity>(&self, id: Uuid) -> CrmResult<Record<T>> {
        self.find::<T>(id)?.ok_or_else(|| CrmError::NotFound {
            entity: T::LABEL,
            id: id.to_string(),
        })
    }

    pub fn find<T: Entity>(&self, id: Uuid) -> CrmResult<Option<Record<T>>> {
        match self.tree::<T>()?.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Resolves a string reference (`leadId`, `agentId`, ...) if it names
    /// an existing record. Dangling or malformed references yield `None`.
    pub fn resolve<T: Entity>(&self, reference: Option<&str>) -> CrmResult<Option<Record<T>>> {
        match reference.and_then(|r| Uuid::parse_str(r).ok()) {
            Some(id) => self.find::<T>(id),
            None => Ok(None),
        }
    }

    /// Every record of a collection, newest first.
    pub fn all<T: Entity>(&self) -> CrmResult<Vec<Record<T>>> {
        let mut records = vec![];
        for item in self.tree::<T>()?.iter() {
            let (_, value) = item?;
            records.push(serde_json::from_slice::<Record<T>>(&value)?);
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Filtered page of a collection, newest first.
    pub fn list<T: Entity>(&self, filter: &ListFilter) -> CrmResult<Vec<Record<T>>> {
        let search = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        Ok(self
            .all::<T>()?
            .into_iter()
            .filter(|r| match filter.status.as_deref() {
                Some(status) => r.data.status_label() == Some(status),
                None => true,
            })
            .filter(|r| match search.as_deref() {
                Some(q) => r.data.search_text().contains(q),
                None => true,
            })
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    pub fn count<T: Entity>(&self) -> CrmResult<usize> {
        Ok(self.tree::<T>()?.len())
    }

    /// Replaces the data of an existing record and bumps `updatedAt`.
    ///
    /// The write is a compare-and-swap against the document that was read,
    /// so a record deleted or rewritten in between is never resurrected or
    /// clobbered; a lost race rereads and tries again.
    pub fn update<T: Entity>(&self, id: Uuid, data: T) -> CrmResult<Record<T>> {
        let tree = self.tree::<T>()?;
        loop {
            let current = tree.get(id.as_bytes())?.ok_or_else(|| CrmError::NotFound {
                entity: T::LABEL,
                id: id.to_string(),
            })?;
            let existing: Record<T> = serde_json::from_slice(&current)?;
            let record = Record {
                id,
                created_at: existing.created_at,
                updated_at: Utc::now(),
                data: data.clone(),
            };
            let swapped = tree.compare_and_swap(
                id.as_bytes(),
                Some(&current[..]),
                Some(serde_json::to_vec(&record)?),
            )?;
            match swapped {
                Ok(()) => {
                    debug!(collection = T::COLLECTION, %id, "updated record");
                    return Ok(record);
                }
                Err(_) => debug!(collection = T::COLLECTION, %id, "record changed during update, retrying"),
            }
        }
    }

    pub fn delete<T: Entity>(&self, id: Uuid) -> CrmResult<()> {
        match self.tree::<T>()?.remove(id.as_bytes())? {
            Some(_) => {
                debug!(collection = T::COLLECTION, %id, "deleted record");
                Ok(())
            }
            None => Err(CrmError::NotFound {
                entity: T::LABEL,
                id: id.to_string(),
            }),
        }
    }

    // --- Users ---

    /// Inserts a user, enforcing unique usernames and emails.
    ///
    /// The record and both index entries are written in one transaction, so
    /// a rejected insert leaves nothing behind.
    pub fn create_user(&self, data: UserData) -> CrmResult<User> {
        let now = Utc::now();
        let user = Record {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            data,
        };
        let users = self.tree::<UserData>()?;
        let doc = serde_json::to_vec(&user)?;
        let username_key = user.data.username.to_lowercase();
        let email_key = user.data.email.to_lowercase();

        let outcome = (&users, &self.usernames, &self.user_emails).transaction(
            |(users, usernames, emails)| {
                if usernames.get(username_key.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort("username"));
                }
                if emails.get(email_key.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort("email"));
                }
                usernames.insert(username_key.as_bytes(), &user.id.as_bytes()[..])?;
                emails.insert(email_key.as_bytes(), &user.id.as_bytes()[..])?;
                users.insert(&user.id.as_bytes()[..], doc.as_slice())?;
                Ok(())
            },
        );

        match outcome {
            Ok(()) => {
                info!(username = %user.data.username, id = %user.id, "created user");
                Ok(user)
            }
            Err(TransactionError::Abort(field)) => Err(CrmError::Conflict {
                entity: UserData::LABEL,
                field,
            }),
            Err(TransactionError::Storage(err)) => Err(err.into()),
        }
    }

    pub fn find_user_by_username(&self, username: &str) -> CrmResult<Option<User>> {
        let id = self
            .usernames
            .get(username.to_lowercase().as_bytes())?
            .and_then(|id| Uuid::from_slice(&id).ok());
        match id {
            Some(id) => self.find::<UserData>(id),
            None => Ok(None),
        }
    }

    /// All users, oldest first (insertion order for the admin listing).
    pub fn list_users(&self) -> CrmResult<Vec<User>> {
        let mut users = self.all::<UserData>()?;
        users.reverse();
        Ok(users)
    }

    // --- Relationship queries ---

    /// Messages of one conversation in the order they were written.
    pub fn messages_in_conversation(&self, conversation_id: &str) -> CrmResult<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .all::<MessageData>()?
            .into_iter()
            .filter(|m| m.data.conversation_id == conversation_id)
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    pub fn activities_for_lead(&self, lead_id: Uuid) -> CrmResult<Vec<Activity>> {
        let lead_id = lead_id.to_string();
        Ok(self
            .all::<ActivityData>()?
            .into_iter()
            .filter(|a| a.data.lead_id.as_deref() == Some(lead_id.as_str()))
            .collect())
    }

    /// Latest activities with their lead, agent and property embedded.
    pub fn activity_feed(&self, limit: usize) -> CrmResult<Vec<ActivityWithRelations>> {
        self.all::<ActivityData>()?
            .into_iter()
            .take(limit)
            .map(|activity| {
                Ok(ActivityWithRelations {
                    lead: self.resolve::<LeadData>(activity.data.lead_id.as_deref())?,
                    agent: self.resolve::<AgentData>(activity.data.agent_id.as_deref())?,
                    property: self.resolve::<PropertyData>(activity.data.property_id.as_deref())?,
                    activity,
                })
            })
            .collect()
    }

    /// Flushes pending writes; used by the scripts before exiting.
    pub fn flush(&self) -> CrmResult<()> {
        self.db.flush()?;
        Ok(())
    }
}
