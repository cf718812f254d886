//! Default permission template applied to every new account.

use acct_common::{Identity, PermissionGrant};

/// Grants scoped to the new identity only
const OWN_GRANTS: &[(&str, &str)] = &[
    ("account", "login"),
    ("account", "edit"),
    ("account", "view"),
    ("payments", "create"),
    ("payments", "view"),
    ("payments", "report"),
];

/// Grants shared with every identity
const SHARED_GRANTS: &[(&str, &str)] = &[("carparks", "book"), ("carparks", "report")];

/// Build the starting grant set for `identity`.
///
/// Order is fixed and part of the register response: identity-scoped grants
/// first, wildcard grants last.
pub fn default_grants(identity: &Identity) -> Vec<PermissionGrant> {
    OWN_GRANTS
        .iter()
        .map(|(name, action)| PermissionGrant::scoped(name, action, identity))
        .chain(
            SHARED_GRANTS
                .iter()
                .map(|(name, action)| PermissionGrant::wildcard(name, action)),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grants_order() {
        let ident = Identity::new("5f46cf19-5399-55e3-aa62-0e7c19382250");
        let grants = default_grants(&ident);

        let pairs: Vec<(&str, &str, &str)> = grants
            .iter()
            .map(|g| (g.name.as_str(), g.action.as_str(), g.identifier.as_str()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("account", "login", ident.as_str()),
                ("account", "edit", ident.as_str()),
                ("account", "view", ident.as_str()),
                ("payments", "create", ident.as_str()),
                ("payments", "view", ident.as_str()),
                ("payments", "report", ident.as_str()),
                ("carparks", "book", "*"),
                ("carparks", "report", "*"),
            ]
        );
    }

    #[test]
    fn test_default_grants_pure() {
        let a = Identity::new("a");
        assert_eq!(default_grants(&a), default_grants(&a));
        assert_ne!(default_grants(&a), default_grants(&Identity::new("b")));
        assert!(default_grants(&a).iter().filter(|g| g.is_wildcard()).count() == 2);
    }
}
