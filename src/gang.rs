//! Composite pipeline.
//!
//! A [`Gang`] wraps an ordered roster of stages and is itself a stage: demands
//! go to the last member, readiness and supply belong to the first. From the
//! outside a gang cannot be told apart from a single worker, so gangs can feed
//! workers, be fed by them, and sit inside other gangs.
//!
//! The roster always satisfies `roster[i].supply == roster[i - 1]` for `i > 0`.
//! Structural changes go through [`Roster`](crate::Roster), which restores the
//! links after every mutation.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::GANG_NAME;
use crate::error::{Error, Result};
use crate::roster::Roster;
use crate::supply::{Stage, Supply, SupplyRef, same_supply};
use crate::worker::Worker;

/// One entry of a gang's roster: a worker or another gang.
pub struct Member<T> {
    stage: Arc<dyn Stage<T, T>>,
}

impl<T> Clone for Member<T> {
    fn clone(&self) -> Self {
        Self { stage: Arc::clone(&self.stage) }
    }
}

impl<T> Deref for Member<T> {
    type Target = dyn Stage<T, T>;

    fn deref(&self) -> &Self::Target {
        self.stage.as_ref()
    }
}

impl<T: Send + 'static> From<Worker<T, T>> for Member<T> {
    fn from(worker: Worker<T, T>) -> Self {
        Self { stage: Arc::new(worker) }
    }
}

impl<T: Send + 'static> From<Gang<T>> for Member<T> {
    fn from(gang: Gang<T>) -> Self {
        Self { stage: Arc::new(gang) }
    }
}

impl<T> PartialEq for Member<T> {
    fn eq(&self, other: &Self) -> bool {
        same_supply(&self.stage.as_supply(), &other.stage.as_supply())
    }
}

impl<T: Send + 'static> PartialEq<Worker<T, T>> for Member<T> {
    fn eq(&self, other: &Worker<T, T>) -> bool {
        same_supply(&self.stage.as_supply(), &other.as_supply())
    }
}

impl<T: Send + 'static> PartialEq<Gang<T>> for Member<T> {
    fn eq(&self, other: &Gang<T>) -> bool {
        same_supply(&self.stage.as_supply(), &other.as_supply())
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Member").field(&self.stage.name()).finish()
    }
}

/// An ordered group of stages usable as a single stage.
///
/// Every member consumes and produces `T`. Type-changing stages such as a
/// batch worker or a relay to another type cannot join the roster; chain them
/// before or after the gang with `|` instead.
pub struct Gang<T> {
    crew: Arc<Crew<T>>,
}

/// The shared roster behind every clone of a [`Gang`].
pub(crate) struct Crew<T> {
    /// Members in order, head first.
    pub(crate) members: RwLock<Vec<Member<T>>>,
}

impl<T: Send + 'static> Gang<T> {
    /// Links `members` in order; each member after the first is supplied by its predecessor.
    ///
    /// The first member keeps whatever supply it already has.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a source appears after the first position.
    pub fn new<M>(members: impl IntoIterator<Item = M>) -> Result<Self>
    where
        M: Into<Member<T>>,
    {
        let gang = Self::empty();
        for member in members {
            gang.roster().push(member)?;
        }
        Ok(gang)
    }

    /// A gang with no members. It is not ready to work until a member is pushed.
    pub fn empty() -> Self {
        Self { crew: Arc::new(Crew { members: RwLock::new(Vec::new()) }) }
    }

    /// The link-maintenance view of this gang's roster.
    #[inline]
    pub fn roster(&self) -> Roster<'_, T> {
        Roster::new(self)
    }

    /// The members in order, head first.
    pub fn members(&self) -> Vec<Member<T>> {
        self.crew.members.read().clone()
    }

    /// The first member, which owns the gang's supply.
    pub fn head(&self) -> Option<Member<T>> {
        self.crew.members.read().first().cloned()
    }

    /// The last member, which answers the gang's demands.
    pub fn tail(&self) -> Option<Member<T>> {
        self.crew.members.read().last().cloned()
    }

    /// Number of members in the roster.
    #[inline]
    pub fn len(&self) -> usize {
        self.crew.members.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.crew.members.read().is_empty()
    }

    pub(crate) fn crew(&self) -> &Crew<T> {
        &self.crew
    }
}

impl<T: Send + 'static> Default for Gang<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Send + 'static> Supply<T> for Crew<T> {
    #[tracing::instrument(level = "trace", skip_all, fields(worker = GANG_NAME))]
    fn demand(&self) -> Result<Option<T>> {
        // Release the roster lock before the demand travels up the chain.
        let tail = self.members.read().last().cloned();
        match tail {
            Some(tail) => tail.demand(),
            None => Err(Error::Readiness { worker: GANG_NAME.to_owned() }),
        }
    }

    fn ready_to_work(&self) -> bool {
        let head = self.members.read().first().cloned();
        head.is_some_and(|head| head.ready_to_work())
    }

    fn name(&self) -> &str {
        GANG_NAME
    }
}

impl<T: Send + 'static> Supply<T> for Gang<T> {
    #[inline]
    fn demand(&self) -> Result<Option<T>> {
        self.crew.demand()
    }

    #[inline]
    fn ready_to_work(&self) -> bool {
        self.crew.ready_to_work()
    }

    #[inline]
    fn name(&self) -> &str {
        GANG_NAME
    }
}

impl<T: Send + 'static> Stage<T, T> for Gang<T> {
    fn supply(&self) -> Option<SupplyRef<T>> {
        self.head().and_then(|head| head.supply())
    }

    fn set_supply(&self, supply: Option<SupplyRef<T>>) -> Result<()> {
        match self.head() {
            Some(head) => head.set_supply(supply),
            None if supply.is_none() => Ok(()),
            None => Err(Error::configuration("gang has no workers to accept a supply")),
        }
    }

    fn as_supply(&self) -> SupplyRef<T> {
        Arc::clone(&self.crew) as SupplyRef<T>
    }
}

impl<T> Clone for Gang<T> {
    fn clone(&self) -> Self {
        Self { crew: Arc::clone(&self.crew) }
    }
}

impl<T> PartialEq for Gang<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.crew, &other.crew)
    }
}

impl<T> Eq for Gang<T> {}

impl<T> fmt::Debug for Gang<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gang").field("members", &*self.crew.members.read()).finish()
    }
}
