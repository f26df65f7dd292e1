//! The RPC client façade.
//!
//! [`TaxonClient`] ties the layers together: it builds a [`MethodCall`]
//! for the configured object, encodes it, hands the bytes to a
//! [`Transport`], decodes the reply and shapes it into a Rust value.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use taxon_protocol::{
    BinaryCodec, Method, MethodCall, ObjectInfo, ObjectProvenanceAction, ObjectReference,
    ProtocolError, Record, Value,
};
use taxon_session::Token;
use taxon_transport::{Exchange, HttpTransport, Transport};

use crate::config::Settings;
use crate::{ClientConfig, ClientError};

/// Sequence ids for outgoing calls. Replies are matched by method name, so
/// these only help correlate logs on both ends.
static NEXT_SEQID: AtomicI32 = AtomicI32::new(1);

/// Client for one taxon object.
///
/// Holds no mutable state: clones share the same configuration and
/// transport, and any number of calls may be in flight at once. Each call
/// resolves exactly once, to a value or to a [`ClientError`].
pub struct TaxonClient<T: Transport = HttpTransport> {
    settings: Arc<Settings>,
    transport: Arc<T>,
    codec: BinaryCodec,
}

impl TaxonClient<HttpTransport> {
    /// Validates `config` and builds a client that talks HTTP(S).
    ///
    /// # Errors
    /// [`ClientError::Configuration`] if the endpoint isn't an absolute
    /// `http`/`https` URL, the reference is empty or malformed, or the
    /// timeout is zero.
    pub fn create(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T: Transport> TaxonClient<T> {
    /// Validates `config` and builds a client over any transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ClientError> {
        let settings = config.validate()?;
        tracing::info!(
            reference = %settings.reference,
            endpoint = %settings.endpoint,
            timeout_ms = settings.timeout.as_millis() as u64,
            authenticated = settings.token.is_some(),
            "taxon client created"
        );
        Ok(Self {
            settings: Arc::new(settings),
            transport: Arc::new(transport),
            codec: BinaryCodec,
        })
    }

    /// The object every call is about.
    pub fn reference(&self) -> &ObjectReference {
        &self.settings.reference
    }

    /// Performs one call and returns the raw decoded result.
    ///
    /// `Ok(None)` only happens for methods whose result is optional
    /// ([`Method::result_optional`]).
    pub async fn call(&self, method: Method) -> Result<Option<Value>, ClientError> {
        let seqid = NEXT_SEQID.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();
        tracing::debug!(%method, reference = %self.settings.reference, seqid, "call started");

        let result = self.exchange(method, seqid).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::debug!(%method, seqid, elapsed_ms, "call finished"),
            Err(e) => tracing::debug!(
                %method,
                seqid,
                elapsed_ms,
                kind = ?e.kind(),
                error = %e,
                "call failed"
            ),
        }
        result
    }

    async fn exchange(&self, method: Method, seqid: i32) -> Result<Option<Value>, ClientError> {
        let call = MethodCall::for_reference(method, &self.settings.reference);
        let body = self.codec.encode_call(&call, seqid)?;

        let response = self
            .transport
            .send(Exchange {
                endpoint: &self.settings.endpoint,
                body,
                token: self.settings.token.as_ref().map(Token::as_str),
                timeout: self.settings.timeout,
            })
            .await?;

        Ok(self.codec.decode_reply(method, &response)?)
    }

    /// Calls a method whose result is required.
    async fn required(&self, method: Method) -> Result<Value, ClientError> {
        self.call(method)
            .await?
            .ok_or_else(|| ProtocolError::MissingResult(method.wire_name()).into())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Reference to the parent taxon, or `None` at the root of the tree.
    pub async fn get_parent(&self) -> Result<Option<String>, ClientError> {
        let method = Method::GetParent;
        match self.call(method).await? {
            Some(value) => shape(method, value, Value::into_string).map(Some),
            None => Ok(None),
        }
    }

    /// References to the child taxa.
    pub async fn get_children(&self) -> Result<Vec<String>, ClientError> {
        self.string_list(Method::GetChildren).await
    }

    /// References to genome annotations of this taxon.
    pub async fn get_genome_annotations(&self) -> Result<Vec<String>, ClientError> {
        self.string_list(Method::GetGenomeAnnotations).await
    }

    /// Scientific names of the ancestors, from the root down.
    pub async fn get_scientific_lineage(&self) -> Result<Vec<String>, ClientError> {
        self.string_list(Method::GetScientificLineage).await
    }

    pub async fn get_scientific_name(&self) -> Result<String, ClientError> {
        self.string(Method::GetScientificName).await
    }

    /// NCBI taxonomic id.
    pub async fn get_taxonomic_id(&self) -> Result<i64, ClientError> {
        self.int(Method::GetTaxonomicId).await
    }

    /// Kingdom name, if the taxon records one.
    pub async fn get_kingdom(&self) -> Result<Option<String>, ClientError> {
        let method = Method::GetKingdom;
        match self.call(method).await? {
            Some(value) => shape(method, value, Value::into_string).map(Some),
            None => Ok(None),
        }
    }

    pub async fn get_domain(&self) -> Result<String, ClientError> {
        self.string(Method::GetDomain).await
    }

    /// Genetic code table number.
    pub async fn get_genetic_code(&self) -> Result<i32, ClientError> {
        let method = Method::GetGeneticCode;
        let value = self.required(method).await?;
        shape(method, value, |v| match v {
            Value::I32(code) => Some(code),
            _ => None,
        })
    }

    pub async fn get_aliases(&self) -> Result<Vec<String>, ClientError> {
        self.string_list(Method::GetAliases).await
    }

    /// Storage metadata of the taxon object itself.
    pub async fn get_info(&self) -> Result<ObjectInfo, ClientError> {
        let method = Method::GetInfo;
        let value = self.required(method).await?;
        let record = shape(method, value, Value::into_record)?;
        Ok(ObjectInfo::from_record(record)?)
    }

    /// Every saved version of the taxon object, oldest first.
    pub async fn get_history(&self) -> Result<Vec<ObjectInfo>, ClientError> {
        self.records(Method::GetHistory, ObjectInfo::from_record).await
    }

    /// How the taxon object was made, one entry per processing step.
    pub async fn get_provenance(&self) -> Result<Vec<ObjectProvenanceAction>, ClientError> {
        self.records(Method::GetProvenance, ObjectProvenanceAction::from_record)
            .await
    }

    /// Numeric object id.
    pub async fn get_id(&self) -> Result<i64, ClientError> {
        self.int(Method::GetId).await
    }

    /// Object name.
    pub async fn get_name(&self) -> Result<String, ClientError> {
        self.string(Method::GetName).await
    }

    /// Object version.
    pub async fn get_version(&self) -> Result<String, ClientError> {
        self.string(Method::GetVersion).await
    }

    async fn string(&self, method: Method) -> Result<String, ClientError> {
        let value = self.required(method).await?;
        shape(method, value, Value::into_string)
    }

    async fn string_list(&self, method: Method) -> Result<Vec<String>, ClientError> {
        let value = self.required(method).await?;
        shape(method, value, Value::into_string_list)
    }

    async fn records<R>(
        &self,
        method: Method,
        from_record: fn(Record) -> Result<R, ProtocolError>,
    ) -> Result<Vec<R>, ClientError> {
        let value = self.required(method).await?;
        let records = shape(method, value, |v| {
            v.into_items()?
                .into_iter()
                .map(Value::into_record)
                .collect::<Option<Vec<_>>>()
        })?;
        Ok(records
            .into_iter()
            .map(from_record)
            .collect::<Result<_, _>>()?)
    }

    async fn int(&self, method: Method) -> Result<i64, ClientError> {
        let value = self.required(method).await?;
        shape(method, value, |v| v.as_i64())
    }
}

/// Converts a decoded value into the accessor's return type.
fn shape<R>(
    method: Method,
    value: Value,
    convert: impl FnOnce(Value) -> Option<R>,
) -> Result<R, ClientError> {
    let tag = value.tag();
    convert(value).ok_or_else(|| {
        ProtocolError::ResultType {
            method: method.wire_name(),
            expected: method.result().to_string(),
            found: tag,
        }
        .into()
    })
}

impl<T: Transport> Clone for TaxonClient<T> {
    fn clone(&self) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            transport: Arc::clone(&self.transport),
            codec: self.codec,
        }
    }
}

impl<T: Transport> fmt::Debug for TaxonClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaxonClient")
            .field("reference", &self.settings.reference.as_str())
            .field("endpoint", &self.settings.endpoint.as_str())
            .field("timeout", &self.settings.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use taxon_protocol::{FaultCause, RemoteFault, TypeTag};
    use taxon_transport::TransportError;

    use super::*;
    use crate::ErrorKind;

    // =====================================================================
    // Stub transport
    // =====================================================================

    type Responder =
        Box<dyn Fn(&MethodCall, i32) -> Result<Vec<u8>, TransportError> + Send + Sync>;

    /// Decodes each call, records it, and answers with `respond`.
    struct StubTransport {
        respond: Responder,
        seen: Mutex<Vec<(MethodCall, Option<String>)>>,
    }

    impl StubTransport {
        fn new(
            respond: impl Fn(&MethodCall, i32) -> Result<Vec<u8>, TransportError>
            + Send
            + Sync
            + 'static,
        ) -> Self {
            Self {
                respond: Box::new(respond),
                seen: Mutex::new(Vec::new()),
            }
        }

        /// Replies to every call with `value`, whatever the method.
        fn replying(value: Option<Value>) -> Self {
            Self::new(move |call, seqid| {
                Ok(BinaryCodec
                    .encode_reply(call.method, seqid, value.as_ref())
                    .unwrap())
            })
        }
    }

    impl Transport for StubTransport {
        async fn send(&self, exchange: Exchange<'_>) -> Result<Vec<u8>, TransportError> {
            let (call, seqid) = BinaryCodec
                .decode_call(&exchange.body)
                .expect("client should send valid calls");
            let response = (self.respond)(&call, seqid);
            self.seen
                .lock()
                .unwrap()
                .push((call, exchange.token.map(str::to_string)));
            response
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::new("993/674615/1", "http://localhost:9101")
    }

    fn client(transport: StubTransport) -> TaxonClient<StubTransport> {
        TaxonClient::with_transport(config(), transport).unwrap()
    }

    // =====================================================================
    // Construction
    // =====================================================================

    #[test]
    fn test_create_rejects_bad_config() {
        let err = TaxonClient::create(ClientConfig::new("", "http://localhost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_client_is_send_sync_clone() {
        fn assert_traits<C: Send + Sync + Clone + 'static>() {}
        assert_traits::<TaxonClient>();
        assert_traits::<TaxonClient<StubTransport>>();
    }

    #[test]
    fn test_debug_hides_token() {
        let config = config().with_token(Token::new("SECRET").unwrap());
        let client = TaxonClient::with_transport(config, StubTransport::replying(None)).unwrap();
        assert!(!format!("{client:?}").contains("SECRET"));
    }

    // =====================================================================
    // Request shape
    // =====================================================================

    #[tokio::test]
    async fn test_reference_is_the_only_argument_and_token_is_out_of_band() {
        let config = config().with_token(Token::new("TOKEN123").unwrap());
        let client = TaxonClient::with_transport(
            config,
            StubTransport::replying(Some(Value::string("Eukaryota"))),
        )
        .unwrap();

        client.get_domain().await.unwrap();

        let seen = client.transport.seen.lock().unwrap();
        let (call, token) = &seen[0];
        assert_eq!(call.method, Method::GetDomain);
        assert_eq!(call.args, vec![Value::string("993/674615/1")]);
        assert_eq!(token.as_deref(), Some("TOKEN123"));
    }

    #[tokio::test]
    async fn test_unauthenticated_client_sends_no_token() {
        let client = client(StubTransport::replying(Some(Value::string("Eukaryota"))));
        client.get_domain().await.unwrap();
        assert_eq!(client.transport.seen.lock().unwrap()[0].1, None);
    }

    #[tokio::test]
    async fn test_each_call_gets_a_fresh_seqid() {
        let seqids = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&seqids);
        let client = client(StubTransport::new(move |call, seqid| {
            recorded.lock().unwrap().push(seqid);
            Ok(BinaryCodec
                .encode_reply(call.method, seqid, Some(&Value::string("x")))
                .unwrap())
        }));

        client.get_name().await.unwrap();
        client.get_name().await.unwrap();

        let seqids = seqids.lock().unwrap();
        assert_ne!(seqids[0], seqids[1]);
    }

    // =====================================================================
    // Result shaping
    // =====================================================================

    #[tokio::test]
    async fn test_accessors_shape_results() {
        let client = client(StubTransport::new(|call, seqid| {
            let value = match call.method {
                Method::GetTaxonomicId | Method::GetId => Value::I64(747676),
                Method::GetGeneticCode => Value::I32(1),
                Method::GetAliases | Method::GetChildren => Value::string_list(["a", "b"]),
                Method::GetInfo => ObjectInfo::default().to_value(),
                Method::GetHistory => Value::List {
                    elem: TypeTag::Struct,
                    items: vec![ObjectInfo::default().to_value()],
                },
                Method::GetProvenance => Value::List {
                    elem: TypeTag::Struct,
                    items: Vec::new(),
                },
                _ => Value::string("Fungi"),
            };
            Ok(BinaryCodec
                .encode_reply(call.method, seqid, Some(&value))
                .unwrap())
        }));

        assert_eq!(client.get_taxonomic_id().await.unwrap(), 747676);
        assert_eq!(client.get_id().await.unwrap(), 747676);
        assert_eq!(client.get_genetic_code().await.unwrap(), 1);
        assert_eq!(client.get_aliases().await.unwrap(), vec!["a", "b"]);
        assert_eq!(client.get_children().await.unwrap(), vec!["a", "b"]);
        assert_eq!(client.get_kingdom().await.unwrap(), Some("Fungi".into()));
        assert_eq!(client.get_parent().await.unwrap(), Some("Fungi".into()));
        assert_eq!(client.get_info().await.unwrap(), ObjectInfo::default());
        assert_eq!(client.get_history().await.unwrap(), vec![ObjectInfo::default()]);
        assert!(client.get_provenance().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_absent_optional_result_is_none() {
        let client = client(StubTransport::replying(None));
        assert_eq!(client.get_parent().await.unwrap(), None);
        assert_eq!(client.get_kingdom().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_absent_required_result_is_protocol_error() {
        let client = client(StubTransport::replying(None));
        let err = client.get_scientific_name().await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Protocol(ProtocolError::MissingResult("get_scientific_name"))
        );
    }

    #[test]
    fn test_shape_mismatch_is_protocol_error() {
        let err = shape(Method::GetName, Value::I32(3), Value::into_string).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Protocol(ProtocolError::ResultType {
                method: "get_name",
                ..
            })
        ));
    }

    // =====================================================================
    // Failures
    // =====================================================================

    #[tokio::test]
    async fn test_transport_failures_map_to_kinds() {
        let cases = [
            (
                TransportError::Timeout {
                    after: Duration::from_millis(10),
                },
                ErrorKind::Timeout,
            ),
            (
                TransportError::Network {
                    message: "refused".into(),
                    status: None,
                },
                ErrorKind::Network,
            ),
            (
                TransportError::HttpStatus {
                    status: 401,
                    body: String::new(),
                },
                ErrorKind::Authentication,
            ),
            (
                TransportError::HttpStatus {
                    status: 502,
                    body: "bad gateway".into(),
                },
                ErrorKind::HttpStatus,
            ),
        ];
        for (failure, kind) in cases {
            let client = client(StubTransport::new(move |_, _| Err(failure.clone())));
            let err = client.get_domain().await.unwrap_err();
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[tokio::test]
    async fn test_remote_faults_keep_cause_and_message() {
        let client = client(StubTransport::new(|call, seqid| {
            let fault = RemoteFault::new(FaultCause::ObjectReference, "No object 674615");
            Ok(BinaryCodec.encode_fault(call.method, seqid, &fault).unwrap())
        }));
        let err = client.get_domain().await.unwrap_err();
        let fault = err.remote_fault().expect("remote fault");
        assert_eq!(fault.cause, FaultCause::ObjectReference);
        assert_eq!(fault.message, "No object 674615");
        assert_eq!(err.kind(), ErrorKind::Remote);
    }

    #[tokio::test]
    async fn test_garbage_response_is_protocol_error() {
        let client = client(StubTransport::new(|_, _| Ok(b"<html>".to_vec())));
        let err = client.get_domain().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }
}
