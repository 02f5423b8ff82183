use blackjack::{
    Card, Decision, Deck, Round, Suit,
    functional::hand_value,
    messages::{ServerPayload, WireMessage},
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// Play a round to the end, hitting below `stand_at`.
fn play_round(deck: Deck, stand_at: u32) -> Round {
    let mut round = Round::deal(deck).unwrap();
    while round.outcome().is_none() {
        let decision = round.awaiting_decision().then(|| {
            if round.player_hand().value() < stand_at {
                Decision::Hit
            } else {
                Decision::Stand
            }
        });
        round.advance(decision).unwrap();
    }
    round
}

fn bench_hand_value(c: &mut Criterion) {
    let cards = vec![
        Card(2, Suit::Heart),
        Card(3, Suit::Club),
        Card(4, Suit::Diamond),
        Card(1, Suit::Spade),
        Card(12, Suit::Heart),
    ];

    c.bench_function("hand_value_5_cards", |b| {
        b.iter(|| hand_value(black_box(&cards)));
    });
}

fn bench_shuffle(c: &mut Criterion) {
    c.bench_function("deck_shuffle", |b| {
        b.iter(Deck::shuffled);
    });
}

/// Benchmark whole rounds at different standing thresholds
fn bench_full_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_round");

    for stand_at in [12, 17, 21].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("stand_at_{stand_at}")),
            stand_at,
            |b, &stand_at| {
                b.iter(|| play_round(Deck::shuffled(), stand_at));
            },
        );
    }

    group.finish();
}

fn bench_payload_codec(c: &mut Criterion) {
    let payload = ServerPayload::card(Card(13, Suit::Spade));
    let bytes = payload.encode();

    c.bench_function("payload_encode", |b| {
        b.iter(|| black_box(&payload).encode());
    });
    c.bench_function("payload_decode", |b| {
        b.iter(|| ServerPayload::decode(black_box(&bytes)));
    });
}

criterion_group!(game_logic, bench_hand_value, bench_shuffle, bench_full_round);
criterion_group!(wire_codec, bench_payload_codec);
criterion_main!(game_logic, wire_codec);
