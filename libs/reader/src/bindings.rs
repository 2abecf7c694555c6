//! # Binding Registry
//!
//! ## Purpose
//!
//! Routes `namespace.method` lookups to their ordered read bindings. The
//! registry is built once at service construction and read-only after
//! that; every miss is a configuration error naming the missing key so
//! callers never have to guess which half of the route was wrong.
//!
//! When a method carries several bindings their decoded structs are
//! presented as one merged logical record; [`NamespaceBindings::create_type`]
//! synthesizes the matching composite type.

use std::collections::HashMap;
use std::sync::Arc;

use solreader_codec::{RuntimeType, StructTypeBuilder};

use crate::binding::ReadBinding;
use crate::error::{ReaderError, ReaderResult};

/// A contract name/address pair for [`NamespaceBindings::bind`]
#[derive(Debug, Clone)]
pub struct BoundContract {
    /// `namespace.method.index` routing key
    pub name: String,
    /// base58 account address
    pub address: String,
}

type MethodBindings = HashMap<String, Vec<Arc<dyn ReadBinding>>>;

/// namespace → method → ordered bindings
#[derive(Default)]
pub struct NamespaceBindings {
    namespaces: HashMap<String, MethodBindings>,
}

impl NamespaceBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding, creating the namespace and method on first use
    pub fn add_read_binding(
        &mut self,
        namespace: &str,
        method: &str,
        binding: Arc<dyn ReadBinding>,
    ) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .entry(method.to_string())
            .or_default()
            .push(binding);
    }

    pub fn get_read_bindings(
        &self,
        namespace: &str,
        method: &str,
    ) -> ReaderResult<&[Arc<dyn ReadBinding>]> {
        let methods = self.namespaces.get(namespace).ok_or_else(|| {
            ReaderError::invalid_config(format!("no namespace named {namespace}"))
        })?;
        let bindings = methods.get(method).ok_or_else(|| {
            ReaderError::invalid_config(format!("no method named {method} under {namespace}"))
        })?;
        Ok(bindings.as_slice())
    }

    /// Attach addresses to bindings addressed as `namespace.method.index`
    pub fn bind(&self, contracts: &[BoundContract]) -> ReaderResult<()> {
        for contract in contracts {
            let parts: Vec<&str> = contract.name.split('.').collect();
            let [namespace, method, index] = parts.as_slice() else {
                return Err(ReaderError::invalid_config(format!(
                    "bound contract name {} is not namespace.method.index",
                    contract.name
                )));
            };
            let index: usize = index.parse().map_err(|_| {
                ReaderError::invalid_config(format!(
                    "bound contract name {} has a non-numeric index",
                    contract.name
                ))
            })?;

            let bindings = self.get_read_bindings(namespace, method)?;
            let binding = bindings.get(index).ok_or_else(|| {
                ReaderError::invalid_config(format!(
                    "bound contract name {} indexes past {} binding(s)",
                    contract.name,
                    bindings.len()
                ))
            })?;
            binding.bind(&contract.address)?;
        }
        Ok(())
    }

    /// The runtime type a read of `namespace.method` produces: a single
    /// binding's own type, or a synthesized struct concatenating every
    /// contributor's fields in registration order
    pub fn create_type(
        &self,
        namespace: &str,
        method: &str,
        for_encoding: bool,
    ) -> ReaderResult<RuntimeType> {
        let bindings = self.get_read_bindings(namespace, method)?;
        if let [single] = bindings {
            return single.create_type(for_encoding);
        }

        let mut merged = StructTypeBuilder::new(method);
        for binding in bindings {
            let ty = binding.create_type(for_encoding)?;
            let Some((_, fields)) = ty.as_struct() else {
                return Err(ReaderError::invalid_type(format!(
                    "merged read {namespace}.{method} requires struct results, got {}",
                    ty.describe()
                )));
            };
            for (name, field_ty) in fields {
                merged.add_field(name.clone(), field_ty.clone())?;
            }
        }
        Ok(merged.build())
    }
}
