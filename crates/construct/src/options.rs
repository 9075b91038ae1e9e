//! # Resource Options
//!
//! The options a construct request carries for the component, rebuilt into
//! resource handles the routine can pass on to its children.
//!
//! ## Provider References
//!
//! A provider reference is `<urn>::<id>` packed into one string. URNs contain
//! `::` themselves, so the id is whatever follows the *last* separator. An id
//! that itself contains `::` cannot be told apart from the URN; the format does
//! not allow such ids.

use std::collections::BTreeMap;

use output::Output;
use propval::Id;
use propval::Urn;

use crate::error::Error;
use crate::error::Result;

/// Separator between package, URN and id in a provider reference.
pub const REFERENCE_SEPARATOR: &str = "::";

/// A resource known only by its URN, used for parents and explicit dependencies.
#[derive(Debug, Clone)]
pub struct DependencyResource {
    pub urn: Output<Urn>,
}

impl DependencyResource {
    /// A dependency on a resource whose URN is already known.
    pub fn new(urn: Urn) -> Self {
        Self { urn: Output::resolved(urn, Vec::new()) }
    }

    /// A dependency on a resource still being registered.
    pub fn pending(urn: Output<Urn>) -> Self {
        Self { urn }
    }
}

/// A provider instance, identified by URN and provider-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResource {
    pub package: String,
    pub urn: Urn,
    pub id: Id,
}

impl ProviderResource {
    /// Splits `reference` at its last separator into URN and id.
    pub fn parse(package: impl Into<String>, reference: &str) -> Result<Self> {
        let (urn, id) = reference
            .rsplit_once(REFERENCE_SEPARATOR)
            .ok_or_else(|| Error::ProviderReference(reference.to_string()))?;
        Ok(Self { package: package.into(), urn: Urn::from(urn), id: Id::from(id) })
    }

    /// Parses `<package>::<urn>::<id>`: the package ends at the first
    /// separator and the id starts after the last one.
    pub fn parse_qualified(reference: &str) -> Result<Self> {
        let (package, rest) = reference
            .split_once(REFERENCE_SEPARATOR)
            .ok_or_else(|| Error::ProviderReference(reference.to_string()))?;
        Self::parse(package, rest).map_err(|_| Error::ProviderReference(reference.to_string()))
    }

    /// The `<urn>::<id>` form the monitor expects.
    pub fn reference(&self) -> String {
        format!("{}{}{}", self.urn, REFERENCE_SEPARATOR, self.id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    pub aliases: Vec<Urn>,
    pub depends_on: Vec<DependencyResource>,
    pub protect: bool,
    /// Provider per package name.
    pub providers: BTreeMap<String, ProviderResource>,
    pub parent: Option<DependencyResource>,
}

impl ResourceOptions {
    /// Options for a child of `parent` that inherits this resource's providers.
    pub fn child_of(&self, parent: Output<Urn>) -> Self {
        Self {
            providers: self.providers.clone(),
            parent: Some(DependencyResource::pending(parent)),
            ..Self::default()
        }
    }

    /// The provider for the package that owns `type_token` (`pkg:module:Type`).
    pub fn provider_for(&self, type_token: &str) -> Option<&ProviderResource> {
        let package = type_token.split(':').next()?;
        self.providers.get(package)
    }
}
