//! # Chain Reader Service
//!
//! ## Purpose
//!
//! The facade tying the crate together: construction compiles every
//! configured method's schema into account codecs, wraps them with the
//! procedure's output modifiers and registers one binding per procedure.
//! Reads route by `namespace`/`method`; methods with several procedures
//! fan their fetches out concurrently and merge the decoded structs into
//! one logical record.
//!
//! ## Lifecycle
//!
//! `start` and `close` each succeed exactly once; reads are only served
//! between the two. `ready`/`health_report` expose the current state for
//! supervisors.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, info};

use solreader_codec::{
    build_idl_account_codec, with_named_modifiers, EncodingKind, Idl, ModifierConfig, RemoteCodec,
    RuntimeType, StructValue, Value,
};

use crate::binding::AccountReadBinding;
use crate::bindings::{BoundContract, NamespaceBindings};
use crate::byte_reader::{BinaryDataReader, ReadOpts};
use crate::cancel::CancellationToken;
use crate::error::{ReaderError, ReaderResult};
use crate::loaded::LoadedResult;

pub const SERVICE_NAME: &str = "ChainReaderService";

/// Top-level reader configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    pub namespaces: HashMap<String, NamespaceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceConfig {
    pub methods: HashMap<String, MethodConfig>,
}

/// One readable method: a schema document plus the procedures that read
/// accounts decoded through it
#[derive(Debug, Clone, Deserialize)]
pub struct MethodConfig {
    /// IDL JSON for this method's account types
    pub idl: String,
    #[serde(default)]
    pub encoding: EncodingKind,
    pub procedures: Vec<ProcedureConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcedureConfig {
    /// Account type name within the method's IDL
    pub idl_account: String,
    #[serde(default)]
    pub read_opts: Option<ReadOpts>,
    #[serde(default)]
    pub output_modifications: Vec<ModifierConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceState {
    Created,
    Running,
    Closed,
}

/// Account reader facade over a compiled binding registry
pub struct ChainReaderService {
    bindings: NamespaceBindings,
    state: RwLock<ServiceState>,
}

impl ChainReaderService {
    /// Compile the configuration into a binding registry.
    ///
    /// Fails with a configuration error naming the namespace and method
    /// whenever a schema does not parse, does not compile, or a modifier
    /// list does not validate.
    pub fn new(client: Arc<dyn BinaryDataReader>, config: ReaderConfig) -> ReaderResult<Self> {
        let mut bindings = NamespaceBindings::new();

        for (namespace, ns_config) in &config.namespaces {
            for (method, method_config) in &ns_config.methods {
                let idl = Idl::from_json(&method_config.idl).map_err(|e| {
                    ReaderError::invalid_config(format!(
                        "invalid IDL for {namespace}.{method}: {e}"
                    ))
                })?;
                let entry: Arc<dyn RemoteCodec> = Arc::new(
                    build_idl_account_codec(&idl, method_config.encoding.builder()).map_err(
                        |e| {
                            ReaderError::invalid_config(format!(
                                "cannot compile IDL for {namespace}.{method}: {e}"
                            ))
                        },
                    )?,
                );

                for procedure in &method_config.procedures {
                    let codec: Arc<dyn RemoteCodec> = if procedure.output_modifications.is_empty()
                    {
                        Arc::clone(&entry)
                    } else {
                        Arc::new(
                            with_named_modifiers(
                                Arc::clone(&entry),
                                &procedure.idl_account,
                                &procedure.output_modifications,
                            )
                            .map_err(|e| {
                                ReaderError::invalid_config(format!(
                                    "invalid modifiers for {namespace}.{method}.{}: {e}",
                                    procedure.idl_account
                                ))
                            })?,
                        )
                    };

                    debug!(
                        namespace,
                        method,
                        account = %procedure.idl_account,
                        "registered account read binding"
                    );
                    bindings.add_read_binding(
                        namespace,
                        method,
                        Arc::new(AccountReadBinding::new(
                            procedure.idl_account.clone(),
                            codec,
                            Arc::clone(&client),
                            procedure.read_opts.clone(),
                        )),
                    );
                }
            }
        }

        info!(
            namespaces = config.namespaces.len(),
            "chain reader service configured"
        );
        Ok(Self {
            bindings,
            state: RwLock::new(ServiceState::Created),
        })
    }

    pub fn name(&self) -> &'static str {
        SERVICE_NAME
    }

    /// Transition to running; succeeds exactly once
    pub fn start(&self) -> ReaderResult<()> {
        let mut state = self.state.write();
        match *state {
            ServiceState::Created => {
                *state = ServiceState::Running;
                info!(service = SERVICE_NAME, "started");
                Ok(())
            }
            ServiceState::Running => Err(ReaderError::AlreadyStarted),
            ServiceState::Closed => Err(ReaderError::AlreadyClosed),
        }
    }

    /// Transition to closed; succeeds exactly once after a start
    pub fn close(&self) -> ReaderResult<()> {
        let mut state = self.state.write();
        match *state {
            ServiceState::Running => {
                *state = ServiceState::Closed;
                info!(service = SERVICE_NAME, "closed");
                Ok(())
            }
            ServiceState::Created => Err(ReaderError::NotStarted),
            ServiceState::Closed => Err(ReaderError::AlreadyClosed),
        }
    }

    /// Ok while running, the blocking lifecycle error otherwise
    pub fn ready(&self) -> ReaderResult<()> {
        match *self.state.read() {
            ServiceState::Running => Ok(()),
            ServiceState::Created => Err(ReaderError::NotStarted),
            ServiceState::Closed => Err(ReaderError::AlreadyClosed),
        }
    }

    /// Service name mapped to its current blocking error, if any
    pub fn health_report(&self) -> HashMap<String, Option<ReaderError>> {
        HashMap::from([(SERVICE_NAME.to_string(), self.ready().err())])
    }

    /// Attach contract addresses; names follow `namespace.method.index`
    pub fn bind(&self, contracts: &[BoundContract]) -> ReaderResult<()> {
        self.bindings.bind(contracts)
    }

    /// The runtime type a read of `namespace.method` produces
    pub fn create_contract_type(
        &self,
        namespace: &str,
        method: &str,
        for_encoding: bool,
    ) -> ReaderResult<RuntimeType> {
        self.bindings.create_type(namespace, method, for_encoding)
    }

    /// Read and decode the latest value for `namespace.method`.
    ///
    /// A single-procedure method reads inline. A multi-procedure method
    /// preloads every account concurrently on a child token, awaits them
    /// in registration order and merges the decoded structs field-wise;
    /// the first failure cancels the remaining preloads and wins.
    /// `params` is forwarded to every binding; account procedures do not
    /// consume it.
    pub async fn get_latest_value(
        &self,
        ctx: CancellationToken,
        namespace: &str,
        method: &str,
        params: Option<&Value>,
    ) -> ReaderResult<Value> {
        self.ready()?;
        let bindings = self.bindings.get_read_bindings(namespace, method)?;
        debug!(namespace, method, reads = bindings.len(), "serving read");

        if let [single] = bindings {
            return single.get_latest_value(ctx, params, None).await;
        }

        let (child, handle) = ctx.child();
        let preloads: Vec<Arc<LoadedResult>> = bindings
            .iter()
            .map(|binding| {
                let loaded = Arc::new(LoadedResult::new());
                binding.pre_load(child.clone(), Arc::clone(&loaded));
                loaded
            })
            .collect();

        let mut merged = StructValue::new(method);
        for (binding, loaded) in bindings.iter().zip(preloads) {
            match binding
                .get_latest_value(child.clone(), params, Some(loaded))
                .await
            {
                Ok(value) => {
                    let decoded = value.into_struct().ok_or_else(|| {
                        ReaderError::invalid_type(format!(
                            "merged read {namespace}.{method} requires struct results"
                        ))
                    })?;
                    for (name, field) in decoded.into_fields() {
                        merged.insert(name, field)?;
                    }
                }
                Err(err) => {
                    handle.cancel(format!("sibling read for {namespace}.{method} failed"));
                    return Err(err);
                }
            }
        }
        Ok(Value::Struct(merged))
    }
}
