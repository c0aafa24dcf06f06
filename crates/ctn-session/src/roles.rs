//! Role parsing and role-based landing pages.
//!
//! Navigation itself (redirects, history) is a rendering concern; this module
//! only owns the pure mapping `wire role string -> Role -> destination` so it
//! can be tested independently of any navigation side effect.

/// All roles the backend issues. Unknown strings parse to `None` and callers
/// must clear the session rather than guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Parent,
    Vendor,
    Teacher,
}

impl Role {
    /// Parse a wire role, case-insensitively. The backend is inconsistent
    /// about naming ("admin" vs "administrador", "padre" vs "usuario"); both
    /// spellings are accepted.
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrador" => Some(Role::Admin),
            "padre" | "usuario" => Some(Role::Parent),
            "vendedor" => Some(Role::Vendor),
            "profesor" => Some(Role::Teacher),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Parent => "padre",
            Role::Vendor => "vendedor",
            Role::Teacher => "profesor",
        }
    }
}

/// The page a freshly authenticated user of the given role lands on,
/// relative to the site root.
pub fn landing_page(role: Role) -> &'static str {
    match role {
        Role::Admin => "pages/administrador/admin.html",
        Role::Parent => "padres.html",
        Role::Vendor => "pages/Vendedor/pos.html",
        Role::Teacher => "pages/profesores/profesores.html",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_both_admin_spellings() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("Administrador"), Some(Role::Admin));
    }

    #[test]
    fn parse_accepts_legacy_parent_alias() {
        assert_eq!(Role::parse("padre"), Some(Role::Parent));
        assert_eq!(Role::parse("usuario"), Some(Role::Parent));
    }

    #[test]
    fn parse_is_case_and_whitespace_insensitive() {
        assert_eq!(Role::parse("  VENDEDOR "), Some(Role::Vendor));
    }

    #[test]
    fn unknown_role_parses_to_none() {
        assert_eq!(Role::parse("superusuario"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn each_role_has_a_landing_page() {
        assert_eq!(landing_page(Role::Admin), "pages/administrador/admin.html");
        assert_eq!(landing_page(Role::Parent), "padres.html");
        assert_eq!(landing_page(Role::Vendor), "pages/Vendedor/pos.html");
        assert_eq!(
            landing_page(Role::Teacher),
            "pages/profesores/profesores.html"
        );
    }
}
