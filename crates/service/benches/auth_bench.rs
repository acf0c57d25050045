use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use std::time::Duration;

use service::auth::cart::mock::MockCartProvisioner;
use service::auth::domain::{LoginInput, RegisterInput, Role};
use service::auth::events::mock::RecordingEventPublisher;
use service::auth::repository::mock::MockAccountStore;
use service::auth::token::{TokenCodec, TokenKind};
use service::auth::{AuthConfig, AuthService};

fn bench_login(c: &mut Criterion) {
    let svc = AuthService::new(
        Arc::new(MockAccountStore::default()),
        Arc::new(MockCartProvisioner::default()),
        Arc::new(RecordingEventPublisher::default()),
        AuthConfig {
            jwt_secret: "secret".into(),
            access_token_ttl: Duration::from_secs(900),
            refresh_token_ttl: Duration::from_secs(86400),
        },
    );

    // pre-create account outside of the benchmark using a tokio runtime
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(svc.register(RegisterInput {
        email: "bench@example.com".into(),
        password: "Benchmark1".into(),
        first_name: "Bench".into(),
        last_name: "Mark".into(),
        phone: String::new(),
    }))
    .unwrap();

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| {
            rt.block_on(svc.login(LoginInput { email: "bench@example.com".into(), password: "Benchmark1".into() }))
                .unwrap();
        });
    });
}

fn bench_token_validate(c: &mut Criterion) {
    let codec = TokenCodec::new("secret", Duration::from_secs(900), Duration::from_secs(86400));
    let pair = codec.issue_pair(uuid::Uuid::new_v4(), "bench@example.com", Role::Customer).unwrap();

    c.bench_function("token_validate_access", |b| {
        b.iter(|| codec.validate_kind(&pair.access_token, TokenKind::Access).unwrap());
    });
}

criterion_group!(benches, bench_login, bench_token_validate);
criterion_main!(benches);
