//! # Account Read Bindings
//!
//! ## Purpose
//!
//! A binding ties one named account type from a compiled schema to an
//! on-chain address and a byte source. It is the unit the registry routes
//! reads to: fetch the payload (inline or via a preload started earlier),
//! decode it through the codec, and surface cancellation promptly with
//! the caller's cause.
//!
//! Per read the binding moves Idle → Fetching → one terminal outcome
//! (value, error, or cancellation); preloads deliver that outcome through
//! a [`LoadedResult`] exactly once.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use solreader_codec::{RemoteCodec, RuntimeType, Value};

use crate::address::Address;
use crate::byte_reader::{BinaryDataReader, ReadOpts};
use crate::cancel::CancellationToken;
use crate::error::{ReaderError, ReaderResult};
use crate::loaded::LoadedResult;

/// One routable read target
#[async_trait]
pub trait ReadBinding: Send + Sync {
    /// The runtime shape of values this binding produces or accepts
    fn create_type(&self, for_encoding: bool) -> ReaderResult<RuntimeType>;

    /// Attach the on-chain address this binding reads from
    fn bind(&self, contract_address: &str) -> ReaderResult<()>;

    /// Start fetching in the background; `result` receives the payload,
    /// an error, or the cancellation outcome exactly once
    fn pre_load(&self, ctx: CancellationToken, result: Arc<LoadedResult>);

    /// Fetch (or consume the preload) and decode the latest value.
    ///
    /// `params` is part of the read contract for binding kinds that take
    /// call arguments; account reads carry it through unconsumed.
    async fn get_latest_value(
        &self,
        ctx: CancellationToken,
        params: Option<&Value>,
        preload: Option<Arc<LoadedResult>>,
    ) -> ReaderResult<Value>;
}

/// Binding for a single named account type
pub struct AccountReadBinding {
    account_name: String,
    codec: Arc<dyn RemoteCodec>,
    reader: Arc<dyn BinaryDataReader>,
    opts: Option<ReadOpts>,
    address: RwLock<Option<Address>>,
}

impl AccountReadBinding {
    pub fn new(
        account_name: impl Into<String>,
        codec: Arc<dyn RemoteCodec>,
        reader: Arc<dyn BinaryDataReader>,
        opts: Option<ReadOpts>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            codec,
            reader,
            opts,
            address: RwLock::new(None),
        }
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    fn bound_address(&self) -> ReaderResult<Address> {
        (*self.address.read()).ok_or(ReaderError::Unbound)
    }
}

#[async_trait]
impl ReadBinding for AccountReadBinding {
    fn create_type(&self, for_encoding: bool) -> ReaderResult<RuntimeType> {
        Ok(self.codec.create_type(&self.account_name, for_encoding)?)
    }

    fn bind(&self, contract_address: &str) -> ReaderResult<()> {
        let parsed: Address = contract_address.parse()?;
        debug!(account = %self.account_name, address = %parsed, "bound account read");
        *self.address.write() = Some(parsed);
        Ok(())
    }

    fn pre_load(&self, ctx: CancellationToken, result: Arc<LoadedResult>) {
        let address = match self.bound_address() {
            Ok(address) => address,
            Err(err) => {
                let _ = result.fill(Err(err));
                return;
            }
        };

        let reader = Arc::clone(&self.reader);
        let opts = self.opts.clone();
        let account = self.account_name.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                cause = ctx.cancelled() => Err(ReaderError::cancelled(cause)),
                bytes = reader.read_all(address, opts.as_ref()) => bytes,
            };
            if let Err(err) = &outcome {
                debug!(account = %account, %err, "preload finished without a payload");
            }
            let _ = result.fill(outcome);
        });
    }

    async fn get_latest_value(
        &self,
        ctx: CancellationToken,
        _params: Option<&Value>,
        preload: Option<Arc<LoadedResult>>,
    ) -> ReaderResult<Value> {
        let bytes = match preload {
            Some(loaded) => {
                tokio::select! {
                    cause = ctx.cancelled() => return Err(ReaderError::cancelled(cause)),
                    outcome = loaded.wait() => outcome?,
                }
            }
            None => {
                let address = self.bound_address()?;
                tokio::select! {
                    cause = ctx.cancelled() => return Err(ReaderError::cancelled(cause)),
                    outcome = self.reader.read_all(address, self.opts.as_ref()) => outcome?,
                }
            }
        };
        Ok(self.codec.decode(&bytes, &self.account_name)?)
    }
}
