//! Property-based tests for token verification.

use proptest::prelude::*;
use session_verifier::{CustomData, Verifier, VerifierConfig};
use std::sync::Arc;
use std::time::Duration;
use test_utils::fixtures::{TEMP_TOKEN_EXPIRE, TOKEN_EXPIRE};
use test_utils::generators::{
    custom_data_strategy, duration_secs_strategy, junk_token_strategy, numeric_identity_strategy,
    string_identity_strategy,
};
use test_utils::TestEnv;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A freshly issued token verifies without refresh and carries the
    /// identity and payload it was issued with.
    #[test]
    fn prop_fresh_token_is_authorized(
        identity in numeric_identity_strategy(),
        data in custom_data_strategy(),
        elapsed in duration_secs_strategy(TOKEN_EXPIRE.as_secs() - 1),
    ) {
        runtime().block_on(async {
            let env = TestEnv::<u64>::new();
            let token = env.verifier.create_token(&identity, data.clone()).await.unwrap();
            env.advance(elapsed);

            let verified = env.verifier.verify_token(&token).await;
            prop_assert!(verified.is_ok());
            let verified = verified.unwrap();
            prop_assert!(verified.new_token.is_none());
            prop_assert_eq!(verified.claims.identity(), Some(&identity));
            prop_assert_eq!(verified.claims.data, data);

            Ok(())
        })?;
    }

    /// Strings that were never issued are always unauthorized.
    #[test]
    fn prop_junk_is_unauthorized(junk in junk_token_strategy()) {
        runtime().block_on(async {
            let env = TestEnv::<u64>::new();

            let result = env.verifier.verify_token(&junk).await;
            prop_assert!(result.is_err_and(|e| e.is_unauthorized()));
            prop_assert!(env.verifier.is_token_authorized(&junk).await.is_none());

            Ok(())
        })?;
    }

    /// Tokens signed under another key never verify, even with a matching
    /// session record in the shared store.
    #[test]
    fn prop_foreign_key_is_unauthorized(
        identity in numeric_identity_strategy(),
        key in "[a-zA-Z0-9]{16,48}",
    ) {
        prop_assume!(key != test_utils::fixtures::TEST_SIGNING_KEY);
        runtime().block_on(async {
            let env = TestEnv::<u64>::new();
            let foreign = Verifier::<u64>::new(VerifierConfig::new(key), Arc::new(env.store.clone()))
                .unwrap()
                .with_time_fn(env.clock.time_fn());

            let token = foreign.create_token(&identity, CustomData::new()).await.unwrap();

            prop_assert!(env.verifier.verify_token(&token).await.is_err());
            Ok(())
        })?;
    }

    /// A superseded token is accepted only while its grace marker lives.
    #[test]
    fn prop_grace_window_bounds(
        identity in numeric_identity_strategy(),
        wait in duration_secs_strategy(2 * TEMP_TOKEN_EXPIRE.as_secs()),
    ) {
        runtime().block_on(async {
            let env = TestEnv::<u64>::new();
            let token = env.verifier.create_token(&identity, CustomData::new()).await.unwrap();
            env.advance(TOKEN_EXPIRE + Duration::from_secs(1));
            prop_assert!(env.verifier.verify_token(&token).await.unwrap().is_refreshed());

            env.advance(wait);

            let accepted = env.verifier.verify_token(&token).await.is_ok();
            prop_assert_eq!(accepted, wait < TEMP_TOKEN_EXPIRE);
            Ok(())
        })?;
    }

    /// Destroying every session of one identity leaves other identities
    /// alone, including ones whose key fragment shares a prefix. Identities
    /// containing the key separator are refused outright.
    #[test]
    fn prop_destroy_all_isolation(
        target in string_identity_strategy(),
        suffix in "(:uid:)?[a-z*?:]{1,4}",
    ) {
        runtime().block_on(async {
            let env = TestEnv::<String>::new();
            let sibling = format!("{target}{suffix}");

            let survivor = env.verifier.create_token(&sibling, CustomData::new()).await;
            let doomed = env.verifier.create_token(&target, CustomData::new()).await;
            for (identity, issued) in [(&sibling, &survivor), (&target, &doomed)] {
                prop_assert_eq!(issued.is_ok(), !identity.contains(':'));
            }

            env.verifier.destroy_all_tokens(&target).await.unwrap();

            if let Ok(doomed) = doomed {
                prop_assert!(env.verifier.verify_token(&doomed).await.is_err());
            }
            if let Ok(survivor) = survivor {
                prop_assert!(env.verifier.verify_token(&survivor).await.is_ok());
            }
            Ok(())
        })?;
    }
}
