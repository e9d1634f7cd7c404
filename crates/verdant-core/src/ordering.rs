//! Namespace deploy ordering
//!
//! Some namespaces must exist before anything else can deploy: CSR
//! auto-approval has to be in place before kubelets can join, and
//! kube-system components before any workload. The priority list encodes
//! that dependency, not a preference.

/// Namespaces deployed first, in this order, whenever present.
pub const PRIORITY_NAMESPACES: &[&str] = &["auto-approve-csrs", "kube-system"];

/// Order namespaces for deployment.
///
/// Priority namespaces present in the input come first, in the priority
/// list's own order. Everything else follows in its original discovery
/// order - stable, never re-sorted.
pub fn order_namespaces<S: AsRef<str>>(discovered: &[S]) -> Vec<String> {
    let mut ordered = Vec::with_capacity(discovered.len());
    for priority in PRIORITY_NAMESPACES {
        if discovered.iter().any(|ns| ns.as_ref() == *priority) {
            ordered.push((*priority).to_string());
        }
    }
    for ns in discovered {
        let ns = ns.as_ref();
        if !PRIORITY_NAMESPACES.contains(&ns) {
            ordered.push(ns.to_string());
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_namespaces_come_first() {
        let order = order_namespaces(&["app", "kube-system", "auto-approve-csrs"]);
        assert_eq!(order, vec!["auto-approve-csrs", "kube-system", "app"]);
    }

    #[test]
    fn absent_priority_entries_are_skipped() {
        let order = order_namespaces(&["app", "monitoring"]);
        assert_eq!(order, vec!["app", "monitoring"]);
    }

    #[test]
    fn remainder_keeps_discovery_order() {
        let order = order_namespaces(&["zeta", "kube-system", "alpha"]);
        assert_eq!(order, vec!["kube-system", "zeta", "alpha"]);
    }

    #[test]
    fn ordering_is_deterministic() {
        let input = ["b", "auto-approve-csrs", "a"];
        assert_eq!(order_namespaces(&input), order_namespaces(&input));
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(order_namespaces::<&str>(&[]).is_empty());
    }
}
