use crate::models::users::UserImport;

/// Parses freeform pasted user data, one record per line. Tokens are
/// separated by any run of commas, tabs or whitespace; a line needs at
/// least four (identifier, nickname, contact, count) and a numeric
/// count, or it is dropped without comment.
pub fn parse_user_batch(text: &str) -> Vec<UserImport> {
    let mut records = Vec::new();

    for line in text.trim().lines() {
        let tokens: Vec<&str> = line
            .split(|c: char| c == ',' || c == '\t' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .collect();

        if tokens.len() < 4 {
            continue;
        }

        let count = match tokens[3].parse::<i32>() {
            Ok(count) => count,
            Err(_) => continue,
        };

        records.push(UserImport {
            uid: tokens[0].to_string(),
            nickname: tokens[1].to_string(),
            contact: tokens[2].to_string(),
            count,
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_lines_are_dropped() {
        let records = parse_user_batch("U1 Alice 10000 3\nbad_line\nU2 Bob 20000 5");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].uid, "U1");
        assert_eq!(records[1].uid, "U2");
    }

    #[test]
    fn tokens_map_in_order() {
        let records = parse_user_batch("U1 Alice 10000 3");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uid, "U1");
        assert_eq!(records[0].nickname, "Alice");
        assert_eq!(records[0].contact, "10000");
        assert_eq!(records[0].count, 3);
    }

    #[test]
    fn three_tokens_are_not_enough() {
        assert!(parse_user_batch("U1 Alice 10000").is_empty());
    }

    #[test]
    fn mixed_separators_are_accepted() {
        let records = parse_user_batch("U1,Alice\t10000  3\nU2 ,\tBob, 20000,5");

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].nickname, "Bob");
        assert_eq!(records[1].count, 5);
    }

    #[test]
    fn non_numeric_count_drops_the_line() {
        let records = parse_user_batch("U1 Alice 10000 three\nU2 Bob 20000 5");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uid, "U2");
    }

    #[test]
    fn extra_tokens_are_ignored() {
        let records = parse_user_batch("U1 Alice 10000 3 trailing junk");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].count, 3);
    }
}
