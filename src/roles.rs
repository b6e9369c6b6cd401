use crate::data::ColumnMeta;
use indexmap::IndexMap;

/// Semantic role tags the host attaches to columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    XAxis,
    YAxis,
    Legend,
    Group,
    Value,
    SecondaryValue,
    Civilization,
    StartYear,
    EndYear,
    Region,
    Category,
}

impl Role {
    pub const ALL: [Role; 11] = [
        Role::XAxis,
        Role::YAxis,
        Role::Legend,
        Role::Group,
        Role::Value,
        Role::SecondaryValue,
        Role::Civilization,
        Role::StartYear,
        Role::EndYear,
        Role::Region,
        Role::Category,
    ];

    /// Name used in the host's `roles` map
    pub fn name(self) -> &'static str {
        match self {
            Role::XAxis => "xAxis",
            Role::YAxis => "yAxis",
            Role::Legend => "legend",
            Role::Group => "group",
            Role::Value => "value",
            Role::SecondaryValue => "secondaryValue",
            Role::Civilization => "civilization",
            Role::StartYear => "startYear",
            Role::EndYear => "endYear",
            Role::Region => "region",
            Role::Category => "category",
        }
    }

    /// Roles that bind a whole hierarchy (Year → Quarter → Month → Day) to one slot.
    pub fn allows_multiple(self) -> bool {
        matches!(self, Role::XAxis | Role::StartYear | Role::EndYear)
    }
}

/// Role → column indices for one slice of columns.
///
/// Recomputed on every transform; column order and roles may shift between updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleBinding {
    roles: IndexMap<Role, Vec<usize>>,
}

impl RoleBinding {
    pub fn first(&self, role: Role) -> Option<usize> {
        self.roles.get(&role).and_then(|cols| cols.first().copied())
    }

    pub fn all(&self, role: Role) -> &[usize] {
        self.roles.get(&role).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn has(&self, role: Role) -> bool {
        self.roles.contains_key(&role)
    }

    /// Bound column, or the positional fallback for views that predate role tagging.
    pub fn first_or(&self, role: Role, fallback: Option<usize>) -> Option<usize> {
        self.first(role).or(fallback)
    }

    /// Every column claimed by any role.
    pub fn bound_columns(&self) -> Vec<usize> {
        let mut cols: Vec<usize> = self.roles.values().flatten().copied().collect();
        cols.sort_unstable();
        cols.dedup();
        cols
    }
}

/// Scan column metadata for role flags.
///
/// First match wins for single-slot roles; hierarchy roles collect every
/// flagged column in source order.
pub fn resolve_roles<'a, I>(columns: I) -> RoleBinding
where
    I: IntoIterator<Item = &'a ColumnMeta>,
{
    let mut binding = RoleBinding::default();
    for (idx, column) in columns.into_iter().enumerate() {
        for role in Role::ALL {
            if !column.has_role(role.name()) {
                continue;
            }
            let slot = binding.roles.entry(role).or_default();
            if slot.is_empty() || role.allows_multiple() {
                slot.push(idx);
            }
        }
    }
    binding
}

/// First column that no role claims, used when a required role is absent.
pub fn first_unbound(binding: &RoleBinding, column_count: usize) -> Option<usize> {
    let bound = binding.bound_columns();
    (0..column_count).find(|idx| !bound.contains(idx))
}
