//! Common test utilities for workflow integration tests.

use std::time::Duration;
use workflow_tests::{wait_for_services, WorkflowTestContext};

/// Default timeout for waiting on services.
pub const SERVICE_TIMEOUT: Duration = Duration::from_secs(60);

/// Create a new workflow test context, ensuring services are healthy.
///
/// This is the main entry point for workflow tests.
pub async fn setup() -> WorkflowTestContext {
    wait_for_services(SERVICE_TIMEOUT)
        .await
        .expect("Services not healthy - start auth-service and finanzas-service first");

    WorkflowTestContext::new()
        .await
        .expect("Failed to create workflow test context")
}
