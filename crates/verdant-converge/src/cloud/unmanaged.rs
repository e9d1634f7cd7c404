//! Unmanaged clouds
//!
//! Provisioned and maintained outside of this tool. Converging one is a
//! deliberate no-op: the cloud still flows through the pipeline so its
//! clusters and charts converge uniformly, but no command ever runs.

use verdant_core::Cloud;

use crate::error::Result;

pub fn converge(cloud: &Cloud, dry_run: bool) -> Result<()> {
    if dry_run {
        tracing::info!(cloud = %cloud.name, "DRYRUN: unmanaged clouds do not converge");
    } else {
        tracing::info!(cloud = %cloud.name, "unmanaged clouds do not converge");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_core::Attributes;

    fn unmanaged_cloud() -> Cloud {
        let mut attrs = Attributes::new();
        attrs.insert("provisioner".to_string(), "unmanaged".to_string());
        Cloud::from_attributes("corp-cloud", attrs).unwrap()
    }

    #[test]
    fn converge_is_a_no_op() {
        assert!(converge(&unmanaged_cloud(), false).is_ok());
        assert!(converge(&unmanaged_cloud(), true).is_ok());
    }

    #[test]
    fn converge_runs_no_external_command() {
        use crate::cloud::{converge_cloud, CloudOptions};
        use crate::exec::RecordingRunner;

        let runner = RecordingRunner::new();
        converge_cloud(&unmanaged_cloud(), &runner, &CloudOptions::default()).unwrap();
        assert!(runner.invocations().is_empty());
    }
}
