//! User listings.

use std::io::Write;

use storedesk_core::listing::filter_users;
use storedesk_core::{UserProfile, UserRole};

use super::{CliError, Context, Output};

fn user_line(user: &UserProfile) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        user.id,
        user.display_name(),
        user.email,
        user.role
    )
}

pub async fn list<W: Write>(
    ctx: &Context,
    out: &mut Output<W>,
    role: Option<UserRole>,
    json: bool,
) -> Result<(), CliError> {
    let users = ctx.api.list_users(ctx.token()).await?;
    let matching = filter_users(&users, role, None);

    if json {
        return out.json(&matching);
    }
    for user in &matching {
        out.line(user_line(user))?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_user_line_and_json_output() {
        let user: UserProfile = serde_json::from_value(json!({
            "_id": "u1",
            "firstName": "Ada",
            "lastName": "Obi",
            "email": "ada@shop.ng",
            "role": "admin"
        }))
        .unwrap();

        assert_eq!(user_line(&user), "u1\tAda Obi\tada@shop.ng\tadmin");

        let mut out = Output::new(Vec::new());
        out.json(&[&user]).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains("\"email\": \"ada@shop.ng\""), "{text}");
    }
}
