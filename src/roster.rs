//! Link maintenance for a gang's roster.
//!
//! Every operation leaves the roster with each member supplied by its
//! predecessor, and a member that leaves the roster never keeps a reference
//! into it.

use crate::error::Result;
use crate::gang::{Gang, Member};
use crate::supply::{Stage, Supply};

/// Mutating view of a [`Gang`]'s members, obtained from [`Gang::roster`].
pub struct Roster<'a, T> {
    gang: &'a Gang<T>,
}

impl<'a, T: Send + 'static> Roster<'a, T> {
    pub(crate) fn new(gang: &'a Gang<T>) -> Self {
        Self { gang }
    }

    /// Appends `member` after the current tail, which becomes its supply.
    ///
    /// On an empty roster the member keeps its own supply.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the roster is not empty and `member` is a source.
    pub fn push(&self, member: impl Into<Member<T>>) -> Result<()> {
        let member = member.into();
        let mut members = self.gang.crew().members.write();

        if let Some(tail) = members.last() {
            member.set_supply(Some(tail.as_supply()))?;
        }

        tracing::debug!(member = member.name(), position = members.len(), "roster push");
        members.push(member);
        Ok(())
    }

    /// Detaches and returns the tail, leaving it without a supply.
    ///
    /// # Errors
    ///
    /// Propagates a failure to clear the popped member's supply.
    pub fn pop(&self) -> Result<Option<Member<T>>> {
        let mut members = self.gang.crew().members.write();

        let Some(popped) = members.pop() else { return Ok(None) };
        popped.set_supply(None)?;

        tracing::debug!(member = popped.name(), "roster pop");
        Ok(Some(popped))
    }

    /// Detaches and returns the head. The new head is left without a supply,
    /// ready to be supplied from outside the gang.
    ///
    /// # Errors
    ///
    /// Propagates a failure to clear the supply of the shifted member or the new head.
    pub fn shift(&self) -> Result<Option<Member<T>>> {
        let mut members = self.gang.crew().members.write();

        if members.is_empty() {
            return Ok(None);
        }

        let shifted = members.remove(0);
        shifted.set_supply(None)?;
        if let Some(head) = members.first() {
            head.set_supply(None)?;
        }

        tracing::debug!(member = shifted.name(), "roster shift");
        Ok(Some(shifted))
    }

    /// Splices `member` in front of the head.
    ///
    /// The former head is supplied by `member`, and `member` takes over the
    /// former head's external supply, if it had one.
    ///
    /// # Errors
    ///
    /// Returns a configuration error, leaving the roster untouched, if the head
    /// is a source, or if `member` is a source and the head had an external supply.
    pub fn unshift(&self, member: impl Into<Member<T>>) -> Result<()> {
        let member = member.into();
        let mut members = self.gang.crew().members.write();

        if let Some(head) = members.first() {
            let external = head.supply();
            head.set_supply(Some(member.as_supply()))?;

            if let Some(external) = external
                && let Err(error) = member.set_supply(Some(external.clone()))
            {
                head.set_supply(Some(external))?;
                return Err(error);
            }
        }

        tracing::debug!(member = member.name(), "roster unshift");
        members.insert(0, member);
        Ok(())
    }

    /// The members in order, head first.
    pub fn members(&self) -> Vec<Member<T>> {
        self.gang.members()
    }

    /// Number of members in the roster.
    #[inline]
    pub fn len(&self) -> usize {
        self.gang.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.gang.is_empty()
    }
}
