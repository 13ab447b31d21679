//! PaymentService unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use gateway_providers::ProviderResolver;
    use gateway_types::{
        AdapterFactory, Amount, CallbackOutcome, CreatePaymentRequest, GatewayError, Payment,
        PaymentDetails, PaymentId, PaymentRepository, PaymentStatus, PaymentType,
        PaymentUnitOfWork, Provider, ProviderAdapter, ProviderConfigRepository,
        ProviderConfiguration, ProviderError, RepoError, RequestContext,
    };

    use crate::PaymentService;

    // ─────────────────────────────────────────────────────────────────────────
    // Store double
    // ─────────────────────────────────────────────────────────────────────────

    type Rows = Arc<Mutex<HashMap<PaymentId, Payment>>>;

    /// In-memory store; a unit of work stages writes until commit.
    #[derive(Default)]
    pub struct MockRepo {
        rows: Rows,
        fail_update: AtomicBool,
        lose_race: AtomicBool,
    }

    impl MockRepo {
        fn rows(&self) -> Vec<Payment> {
            self.rows.lock().unwrap().values().cloned().collect()
        }

        fn seed(&self, payment: Payment) {
            self.rows.lock().unwrap().insert(payment.id, payment);
        }
    }

    #[async_trait]
    impl PaymentRepository for MockRepo {
        async fn begin(&self) -> Result<Box<dyn PaymentUnitOfWork>, RepoError> {
            Ok(Box::new(MockUnitOfWork {
                rows: Arc::clone(&self.rows),
                staged: HashMap::new(),
                fail_update: self.fail_update.load(Ordering::SeqCst),
                lose_race: self.lose_race.load(Ordering::SeqCst),
            }))
        }

        async fn find_by_external_id(
            &self,
            external_id: &str,
        ) -> Result<Option<Payment>, RepoError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|p| p.external_id.as_deref() == Some(external_id))
                .cloned())
        }

        async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, RepoError> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn update_payment(&self, payment: &Payment) -> Result<(), RepoError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(&payment.id).ok_or(RepoError::NotFound)?;
            *row = payment.clone();
            Ok(())
        }
    }

    struct MockUnitOfWork {
        rows: Rows,
        staged: HashMap<PaymentId, Payment>,
        fail_update: bool,
        lose_race: bool,
    }

    impl MockUnitOfWork {
        fn current(&self, id: PaymentId) -> Option<Payment> {
            self.staged
                .get(&id)
                .cloned()
                .or_else(|| self.rows.lock().unwrap().get(&id).cloned())
        }
    }

    #[async_trait]
    impl PaymentUnitOfWork for MockUnitOfWork {
        async fn insert_payment(&mut self, payment: &Payment) -> Result<(), RepoError> {
            if self.current(payment.id).is_some() {
                return Err(RepoError::Conflict("duplicate id".into()));
            }
            self.staged.insert(payment.id, payment.clone());
            Ok(())
        }

        async fn update_payment(&mut self, payment: &Payment) -> Result<(), RepoError> {
            if self.fail_update {
                return Err(RepoError::Database("disk full".into()));
            }
            if self.current(payment.id).is_none() {
                return Err(RepoError::NotFound);
            }
            self.staged.insert(payment.id, payment.clone());
            Ok(())
        }

        async fn find_by_external_id_for_update(
            &mut self,
            external_id: &str,
        ) -> Result<Option<Payment>, RepoError> {
            let matches = |p: &Payment| p.external_id.as_deref() == Some(external_id);
            if let Some(p) = self.staged.values().find(|p| matches(p)) {
                return Ok(Some(p.clone()));
            }
            Ok(self.rows.lock().unwrap().values().find(|p| matches(p)).cloned())
        }

        async fn transition_status(
            &mut self,
            id: PaymentId,
            from: PaymentStatus,
            to: PaymentStatus,
        ) -> Result<bool, RepoError> {
            if self.lose_race {
                return Ok(false);
            }
            match self.current(id) {
                Some(mut p) if p.status == from => {
                    p.status = to;
                    self.staged.insert(id, p);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn commit(self: Box<Self>) -> Result<(), RepoError> {
            let MockUnitOfWork { rows, staged, .. } = *self;
            rows.lock().unwrap().extend(staged);
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
            Ok(())
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Routing and provider doubles
    // ─────────────────────────────────────────────────────────────────────────

    #[derive(Default)]
    pub struct MockConfigStore {
        rows: Vec<(&'static str, &'static str, ProviderConfiguration)>,
    }

    #[async_trait]
    impl ProviderConfigRepository for MockConfigStore {
        async fn find_provider_config(
            &self,
            currency_code: &str,
            country_code: &str,
        ) -> Result<Option<ProviderConfiguration>, RepoError> {
            Ok(self
                .rows
                .iter()
                .filter(|(cur, cty, _)| *cur == currency_code && *cty == country_code)
                .map(|(_, _, c)| c)
                .min_by_key(|c| (c.priority, c.id))
                .cloned())
        }

        async fn find_provider_by_name(&self, name: &str) -> Result<Option<Provider>, RepoError> {
            Ok(self
                .rows
                .iter()
                .find(|(_, _, c)| c.provider_name == name)
                .map(|(_, _, c)| Provider {
                    id: c.provider_id,
                    name: c.provider_name.clone(),
                }))
        }

        async fn list_provider_names(&self) -> Result<Vec<String>, RepoError> {
            Ok(self
                .rows
                .iter()
                .map(|(_, _, c)| c.provider_name.clone())
                .collect())
        }
    }

    #[derive(Clone)]
    enum Behaviour {
        Succeed { url: String, external_id: String },
        Remote(u16),
    }

    struct MockAdapter {
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProviderAdapter for MockAdapter {
        fn name(&self) -> &'static str {
            "MOCK"
        }

        async fn get_details(
            &self,
            _ctx: &RequestContext,
            _amount: Amount,
            _payment_type: PaymentType,
            _currency_code: &str,
            _country_code: &str,
        ) -> Result<PaymentDetails, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Succeed { url, external_id } => Ok(PaymentDetails {
                    redirect_url: url.clone(),
                    external_id: external_id.clone(),
                }),
                Behaviour::Remote(status) => Err(ProviderError::Remote { status: *status }),
            }
        }
    }

    /// Resolves through the same routing table and hands out [`MockAdapter`]s
    /// for `HSBC` and `ADCB` only.
    pub struct MockFactory {
        resolver: ProviderResolver<MockConfigStore>,
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AdapterFactory for MockFactory {
        async fn get_adapter(
            &self,
            ctx: &RequestContext,
            currency_code: &str,
            country_code: &str,
        ) -> Result<Box<dyn ProviderAdapter>, GatewayError> {
            let config = self
                .resolver
                .find_provider_config(ctx, currency_code, country_code)
                .await?;
            match config.provider_name.as_str() {
                "HSBC" | "ADCB" => Ok(Box::new(MockAdapter {
                    behaviour: self.behaviour.clone(),
                    calls: Arc::clone(&self.calls),
                })),
                other => Err(GatewayError::UnsupportedProvider(other.to_string())),
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fixtures
    // ─────────────────────────────────────────────────────────────────────────

    type Service = PaymentService<MockRepo, MockConfigStore, MockFactory>;

    struct Harness {
        service: Service,
        repo: Arc<MockRepo>,
        calls: Arc<AtomicUsize>,
    }

    fn config(id: i64, provider_id: i64, name: &str, priority: i32) -> ProviderConfiguration {
        ProviderConfiguration {
            id,
            country_id: 1,
            currency_id: 1,
            provider_id,
            provider_name: name.to_string(),
            base_url: "http://provider.test".to_string(),
            priority,
        }
    }

    fn harness(behaviour: Behaviour) -> Harness {
        let store = Arc::new(MockConfigStore {
            rows: vec![
                ("USD", "US", config(1, 1, "HSBC", 1)),
                ("USD", "US", config(2, 2, "ADCB", 2)),
                ("GBP", "GB", config(3, 3, "CITI", 1)),
            ],
        });
        let resolver = ProviderResolver::new(store);
        let calls = Arc::new(AtomicUsize::new(0));
        let factory = MockFactory {
            resolver: resolver.clone(),
            behaviour,
            calls: Arc::clone(&calls),
        };
        let repo = Arc::new(MockRepo::default());
        Harness {
            service: PaymentService::new(Arc::clone(&repo), resolver, factory),
            repo,
            calls,
        }
    }

    fn succeed(external_id: &str) -> Behaviour {
        Behaviour::Succeed {
            url: "https://provider.test/pay/abc".to_string(),
            external_id: external_id.to_string(),
        }
    }

    fn request(currency: &str, country: &str) -> CreatePaymentRequest {
        CreatePaymentRequest {
            user_id: 1,
            amount: Amount::from_minor(4000).unwrap(),
            currency_code: currency.to_string(),
            country_code: country.to_string(),
        }
    }

    fn pending_payment(external_id: &str) -> Payment {
        let mut payment = Payment::initialize(
            1,
            Amount::from_minor(4000).unwrap(),
            PaymentType::Deposit,
            "USD",
            1,
        );
        payment.mark_pending(external_id).unwrap();
        payment
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Create payment
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_payment_persists_one_pending_row() {
        let h = harness(succeed("ext-123"));

        let url = h
            .service
            .create_payment(&RequestContext::new(), request("USD", "US"), PaymentType::Deposit)
            .await
            .unwrap();

        assert_eq!(url, "https://provider.test/pay/abc");
        let rows = h.repo.rows();
        assert_eq!(rows.len(), 1);
        let payment = &rows[0];
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.external_id.as_deref(), Some("ext-123"));
        assert_eq!(payment.provider_id, 1);
        assert_eq!(payment.payment_type, PaymentType::Deposit);
        assert_eq!(payment.amount.minor_units(), 4000);
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_withdrawal_records_type() {
        let h = harness(succeed("ext-w"));

        h.service
            .create_payment(&RequestContext::new(), request("USD", "US"), PaymentType::Withdrawal)
            .await
            .unwrap();

        assert_eq!(h.repo.rows()[0].payment_type, PaymentType::Withdrawal);
    }

    #[tokio::test]
    async fn test_unrouted_pair_is_not_found_and_writes_nothing() {
        let h = harness(succeed("ext-1"));

        let err = h
            .service
            .create_payment(&RequestContext::new(), request("EUR", "DE"), PaymentType::Deposit)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::NotFound(_)));
        assert!(h.repo.rows().is_empty());
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_provider_writes_nothing() {
        let h = harness(succeed("ext-1"));

        let err = h
            .service
            .create_payment(&RequestContext::new(), request("GBP", "GB"), PaymentType::Deposit)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::UnsupportedProvider(name) if name == "CITI"));
        assert!(h.repo.rows().is_empty());
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_rolls_back_insert() {
        let h = harness(Behaviour::Remote(503));

        let err = h
            .service
            .create_payment(&RequestContext::new(), request("USD", "US"), PaymentType::Deposit)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GatewayError::Provider(ProviderError::Remote { status: 503 })
        ));
        assert!(h.repo.rows().is_empty());
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_failure_rolls_back_insert() {
        let h = harness(succeed("ext-1"));
        h.repo.fail_update.store(true, Ordering::SeqCst);

        let err = h
            .service
            .create_payment(&RequestContext::new(), request("USD", "US"), PaymentType::Deposit)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Store(RepoError::Database(_))));
        assert!(h.repo.rows().is_empty());
    }

    #[tokio::test]
    async fn test_empty_external_id_from_provider_rolls_back() {
        let h = harness(succeed(""));

        let err = h
            .service
            .create_payment(&RequestContext::new(), request("USD", "US"), PaymentType::Deposit)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Validation(_)));
        assert!(h.repo.rows().is_empty());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Callbacks
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_success_callback_settles_pending_payment() {
        let h = harness(succeed("unused"));
        let payment = pending_payment("ext-cb");
        h.repo.seed(payment.clone());
        let ctx = RequestContext::new();

        let updated = h
            .service
            .handle_callback(&ctx, "ext-cb", CallbackOutcome::Success)
            .await
            .unwrap();

        assert_eq!(updated.id, payment.id);
        assert_eq!(updated.status, PaymentStatus::Success);
        let stored = h.repo.get_payment(payment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Success);
    }

    #[tokio::test]
    async fn test_repeated_callback_is_stale_and_changes_nothing() {
        let h = harness(succeed("unused"));
        let payment = pending_payment("ext-dup");
        h.repo.seed(payment.clone());
        let ctx = RequestContext::new();

        h.service
            .handle_callback(&ctx, "ext-dup", CallbackOutcome::Success)
            .await
            .unwrap();
        let err = h
            .service
            .handle_callback(&ctx, "ext-dup", CallbackOutcome::Failed)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GatewayError::StaleTransition(PaymentStatus::Success)
        ));
        let stored = h.repo.get_payment(payment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Success);
    }

    #[tokio::test]
    async fn test_callback_for_unknown_payment_is_not_found() {
        let h = harness(succeed("unused"));
        let payment = pending_payment("ext-known");
        h.repo.seed(payment.clone());

        let err = h
            .service
            .handle_callback(&RequestContext::new(), "ext-unknown", CallbackOutcome::Failed)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::NotFound(_)));
        let stored = h.repo.get_payment(payment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_callback_lost_to_concurrent_writer_is_stale() {
        let h = harness(succeed("unused"));
        let payment = pending_payment("ext-race");
        h.repo.seed(payment.clone());
        h.repo.lose_race.store(true, Ordering::SeqCst);

        let err = h
            .service
            .handle_callback(&RequestContext::new(), "ext-race", CallbackOutcome::Success)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::StaleTransition(_)));
        let stored = h.repo.get_payment(payment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_created_payment_accepts_failed_callback() {
        let h = harness(succeed("ext-flow"));
        let ctx = RequestContext::new();

        h.service
            .create_payment(&ctx, request("USD", "US"), PaymentType::Deposit)
            .await
            .unwrap();
        let settled = h
            .service
            .handle_callback(&ctx, "ext-flow", CallbackOutcome::Failed)
            .await
            .unwrap();

        assert_eq!(settled.status, PaymentStatus::Failed);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_find_by_external_id_absent_is_none() {
        let h = harness(succeed("unused"));

        let found = h
            .service
            .find_payment_by_external_id(&RequestContext::new(), "missing")
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_payment_round_trips() {
        let h = harness(succeed("unused"));
        let mut payment = pending_payment("ext-upd");
        h.repo.seed(payment.clone());
        let ctx = RequestContext::new();

        payment.apply_callback(CallbackOutcome::Success).unwrap();
        let stale = payment.updated_at - chrono::Duration::hours(1);
        payment.updated_at = stale;
        h.service.update_payment(&ctx, &mut payment).await.unwrap();
        assert!(payment.updated_at > stale);

        let found = h
            .service
            .find_payment_by_external_id(&ctx, "ext-upd")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.status, PaymentStatus::Success);
        assert_eq!(found.updated_at, payment.updated_at);
    }
}
