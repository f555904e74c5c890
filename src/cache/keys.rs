//! Cache key layout.

use uuid::Uuid;

use crate::application::pagination::OffsetRequest;

const VEHICLE_PREFIX: &str = "vehicles";

/// Matches every cached listing page regardless of offset or limit.
pub const VEHICLE_LIST_PATTERN: &str = "vehicles:list:*";

pub fn vehicle_key(id: Uuid) -> String {
    format!("{VEHICLE_PREFIX}:{id}")
}

pub fn vehicle_list_key(page: &OffsetRequest) -> String {
    format!("{VEHICLE_PREFIX}:list:{}:{}", page.offset(), page.limit())
}

/// Redis-style glob restricted to `*` (any run) and `?` (one character).
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut p, mut k) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, k));
                p += 1;
            }
            Some(&c) if c == '?' || c == key[k] => {
                p += 1;
                k += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    k = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
