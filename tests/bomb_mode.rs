mod common;

use bomb_arena_server::config::GameConfig;
use bomb_arena_server::game::weapons::WEAPON_GAME;
use bomb_arena_server::game::{PlayerInput, Team, WeaponKind, World};
use bomb_arena_server::net::{GameEvent, Recipient, ServerMsg};

use common::*;

fn bomb_holder(world: &World) -> usize {
    world
        .characters()
        .map(|c| c.slot())
        .find(|&slot| world.controller().is_bomb(slot))
        .expect("a bomb is assigned")
}

fn hammer_right(world: &mut World, slot: usize) {
    warm_up(world, slot);
    world.on_direct_input(
        slot,
        PlayerInput {
            wanted_weapon: WeaponKind::Hammer.index() as i32 + 1,
            fire: 1,
            ..idle_input()
        },
    );
}

#[test]
fn lone_player_is_told_to_wait() {
    let mut world = world_with(GameConfig::default(), flat_map(), &[standing_at(5)]);
    let a = world.join("a", Team::Red).unwrap();

    let (_, outbound) = step_n(&mut world, 50);
    assert!(!world.controller().is_bomb(a));
    assert!(outbound.iter().any(|o| o.recipient == Recipient::One(a)
        && matches!(&o.msg, ServerMsg::Broadcast { text } if text == "At least 2 players are required to play")));
}

#[test]
fn bomb_sees_its_fuse() {
    let mut world = world_with(GameConfig::default(), flat_map(), &[standing_at(5)]);
    world.join("a", Team::Red).unwrap();
    world.join("b", Team::Red).unwrap();

    let (_, outbound) = step_n(&mut world, 2);
    let bomb = bomb_holder(&world);
    assert!(outbound.iter().any(|o| o.recipient == Recipient::One(bomb)
        && matches!(&o.msg, ServerMsg::Broadcast { text } if text.starts_with("You are the bomb!"))));

    // Armor shows the fuse, a full fuse is a full bar
    assert_eq!(world.character(bomb).unwrap().armor(), 10);
    step_n(&mut world, 500);
    let armor = world.character(bomb).unwrap().armor();
    assert!((4..=6).contains(&armor), "armor {armor}");
}

#[test]
fn burnt_fuse_detonates_the_bomb() {
    let config = GameConfig {
        bomb_fuse_secs: 1,
        ..GameConfig::default()
    };
    let mut world = world_with(config, flat_map(), &[standing_at(5)]);
    world.join("a", Team::Red).unwrap();
    world.join("b", Team::Red).unwrap();
    world.step();
    let bomb = bomb_holder(&world);

    let (events, outbound) = step_n(&mut world, 60);
    let kill = outbound
        .iter()
        .find_map(|o| match &o.msg {
            ServerMsg::KillMsg(k) => Some(*k),
            _ => None,
        })
        .expect("bomb exploded");
    assert_eq!(kill.victim, bomb as i32);
    assert_eq!(kill.killer, bomb as i32);
    assert_eq!(kill.weapon, WEAPON_GAME);
    assert_eq!(kill.mode_special, 1);

    let explosions = events
        .iter()
        .filter(|e| matches!(e, GameEvent::Explosion { .. }))
        .count();
    assert_eq!(explosions, 5);
}

#[test]
fn bomb_hammer_passes_the_bomb() {
    let mut world = world_with(GameConfig::default(), flat_map(), &[standing_at(5)]);
    let a = world.join("a", Team::Red).unwrap();
    let b = world.join("b", Team::Red).unwrap();
    world.step();
    let bomb = bomb_holder(&world);
    let other = if bomb == a { b } else { a };

    place(&mut world, bomb, standing_at(5));
    place(&mut world, other, standing_at(5) + glam::Vec2::new(40.0, 0.0));
    world.step();
    let fuse = world.controller().fuse(bomb);

    hammer_right(&mut world, bomb);
    assert!(world.controller().is_bomb(other));
    assert_eq!(world.controller().fuse(other), fuse);
    assert_eq!(world.controller().fuse(bomb), 0);
}

#[test]
fn hammering_the_bomb_burns_a_second() {
    let mut world = world_with(GameConfig::default(), flat_map(), &[standing_at(5)]);
    let a = world.join("a", Team::Red).unwrap();
    let b = world.join("b", Team::Red).unwrap();
    world.step();
    let bomb = bomb_holder(&world);
    let other = if bomb == a { b } else { a };

    place(&mut world, other, standing_at(5));
    place(&mut world, bomb, standing_at(5) + glam::Vec2::new(40.0, 0.0));
    world.step();
    let fuse = world.controller().fuse(bomb);

    hammer_right(&mut world, other);
    assert!(world.controller().is_bomb(bomb));
    assert_eq!(world.controller().fuse(bomb), fuse - 50);
}

#[test]
fn hammer_between_runners_stuns_into_ninja() {
    let mut world = world_with(GameConfig::default(), flat_map(), &[standing_at(5)]);
    let slots: Vec<usize> = ["a", "b", "c"]
        .iter()
        .map(|name| world.join(name, Team::Red).unwrap())
        .collect();
    // Let the post-spawn stun cooldown run out
    step_n(&mut world, 10);
    let bomb = bomb_holder(&world);
    let runners: Vec<usize> = slots.into_iter().filter(|&s| s != bomb).collect();
    let (attacker, victim) = (runners[0], runners[1]);

    place(&mut world, bomb, standing_at(30));
    place(&mut world, attacker, standing_at(5));
    place(&mut world, victim, standing_at(5) + glam::Vec2::new(40.0, 0.0));
    world.step();

    hammer_right(&mut world, attacker);
    assert_eq!(world.character(victim).unwrap().active_weapon(), WeaponKind::Ninja);
    assert_eq!(world.players().get(victim).unwrap().stun_tick, 50);
    assert!(world.controller().is_bomb(bomb));

    step_n(&mut world, 50);
    assert_eq!(world.character(victim).unwrap().active_weapon(), WeaponKind::Gun);
}
