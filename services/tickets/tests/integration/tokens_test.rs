use ducktickets_domain::id::{AttendeeId, OrderId};
use ducktickets_tickets::usecase::ticket::TicketSigner;

use crate::helpers::signer;

fn flip(c: char) -> char {
    match c {
        '0' => '1',
        ':' => ';',
        '-' => '_',
        c if c.is_ascii_hexdigit() => '0',
        _ => 'x',
    }
}

#[test]
fn should_reject_every_single_character_mutation() {
    let signer = signer();
    let token = signer.sign(OrderId::new(), AttendeeId::new());
    assert!(signer.verify(&token).is_some());

    for (i, original) in token.char_indices() {
        let mut forged = token.clone();
        forged.replace_range(i..i + 1, &flip(original).to_string());
        assert!(
            signer.verify(&forged).is_none(),
            "mutation at {i} ({original:?}) was accepted: {forged}"
        );
    }
}

#[test]
fn should_reject_token_signed_with_another_secret() {
    let order_id = OrderId::new();
    let attendee_id = AttendeeId::new();
    let foreign = TicketSigner::new("someone-else").sign(order_id, attendee_id);

    assert!(signer().verify(&foreign).is_none());
    assert_eq!(
        signer().verify(&signer().sign(order_id, attendee_id)),
        Some((order_id, attendee_id))
    );
}

#[test]
fn should_reject_truncated_and_extended_tokens() {
    let signer = signer();
    let token = signer.sign(OrderId::new(), AttendeeId::new());

    assert!(signer.verify(&token[..token.len() - 1]).is_none());
    assert!(signer.verify(&format!("{token}0")).is_none());
    assert!(signer.verify("").is_none());
    assert!(signer.verify("a:b:c").is_none());
}
