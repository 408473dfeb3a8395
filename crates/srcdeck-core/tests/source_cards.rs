use srcdeck_core::common::fixed::{FixedFrame, LinkIndex};
use srcdeck_core::common::geometry::{Vec3, WorldAxis, WorldRotation};
use srcdeck_core::common::values::ValueTable;
use srcdeck_core::domain::{SourceErrorCategory, SourceKind, TargetCode};
use srcdeck_core::modules::BuildContext;
use srcdeck_core::modules::sources::SourceModel;
use srcdeck_core::modules::traits::DeckWriter;

fn proton_beam_table() -> ValueTable {
    let mut table = ValueTable::new();
    table.add_variable("gbParticleType", "proton");
    table.add_variable("gbEnergy", 50.0);
    table.add_variable("gbXWidth", 5.887);
    table.add_variable("gbZWidth", 8.326);
    table
}

fn build(kind: SourceKind, key: &str, table: &ValueTable) -> SourceModel {
    let mut model = SourceModel::new(kind, key);
    model
        .create_all(table, &FixedFrame::world("World"), LinkIndex::ORIGIN)
        .expect("source should populate and place");
    model
}

#[test]
fn aligned_gaussian_beam_writes_world_profiles_without_transform() {
    let model = build(SourceKind::GaussBeam, "gb", &proton_beam_table());
    let deck = model.write(TargetCode::Mcnp).expect("mcnp deck");

    assert_eq!(
        deck,
        "sdef par=h erg=50.0 x=d1 y=0.0 z=d2 vec=0.0 1.0 0.0 dir=1.0\n\
         sp1 -41 5.887 0.0\n\
         sp2 -41 8.326 0.0\n"
    );
    assert!(!deck.contains("tr"));
}

#[test]
fn rotated_gaussian_beam_gets_exactly_one_transform() {
    let mut model = build(SourceKind::GaussBeam, "gb", &proton_beam_table());
    model
        .rotate(&WorldRotation::about(WorldAxis::Z, 45.0))
        .expect("rotate");
    let deck = model.write(TargetCode::Mcnp).expect("mcnp deck");

    assert!(deck.lines().next().expect("sdef").ends_with("tr=1"));
    assert_eq!(deck.lines().filter(|line| line.starts_with("tr")).count(), 1);

    model
        .rotate(&WorldRotation::about(WorldAxis::Z, -45.0))
        .expect("rotate back");
    assert!(model.transform().is_none());
    let aligned = build(SourceKind::GaussBeam, "gb", &proton_beam_table());
    assert_eq!(
        model.write(TargetCode::Mcnp).expect("mcnp deck"),
        aligned.write(TargetCode::Mcnp).expect("mcnp deck")
    );
}

#[test]
fn gaussian_beam_phits_block() {
    let model = build(SourceKind::GaussBeam, "gb", &proton_beam_table());
    let deck = model.write(TargetCode::Phits).expect("phits deck");

    assert_eq!(
        deck,
        "[source]\n\
         \x20 s-type   = 3                      # gaussian beam\n\
         \x20 proj     = proton                 # incident particle\n\
         \x20 trcl     = 1                      # local beam frame\n\
         \x20 x0       = 0\n\
         \x20 x1       = 8.326                  # FWHM [cm]\n\
         \x20 y0       = 0\n\
         \x20 y1       = 5.887                  # FWHM [cm]\n\
         \x20 z0       = 0\n\
         \x20 z1       = 0\n\
         \x20 dir      = 1                      # along beam axis\n\
         \x20 e0       = 50                     # energy [MeV]\n\
         [transform]\n\
         \x20 tr1 0 0 0 0 0 1 1 0 0 0 1 0\n"
    );
}

#[test]
fn rotated_gaussian_beam_phits_transform() {
    let mut model = build(SourceKind::GaussBeam, "gb", &proton_beam_table());
    model
        .rotate(&WorldRotation::about(WorldAxis::Z, 45.0))
        .expect("rotate");
    let deck = model.write(TargetCode::Phits).expect("phits deck");
    let lines = deck.lines().collect::<Vec<_>>();

    assert_eq!(lines.iter().filter(|line| line.contains("trcl")).count(), 1);
    assert_eq!(lines[lines.len() - 2], "[transform]");
    assert_eq!(
        lines[lines.len() - 1],
        "  tr1 0 0 0 0 0 1 0.70710678 0.70710678 0 -0.70710678 0.70710678 0"
    );
}

#[test]
fn point_source_direction_depends_on_spread() {
    let mut table = ValueTable::new();
    table.add_variable("ptASpread", 360.0);
    let isotropic = build(SourceKind::Point, "pt", &table)
        .write(TargetCode::Mcnp)
        .expect("isotropic");
    assert_eq!(isotropic, "sdef par=n erg=14.0 pos=0.0 0.0 0.0\n");

    table.add_variable("ptASpread", 0.0);
    let collimated = build(SourceKind::Point, "pt", &table)
        .write(TargetCode::Mcnp)
        .expect("collimated");
    assert_eq!(
        collimated,
        "sdef par=n erg=14.0 pos=0.0 0.0 0.0 vec=0.0 1.0 0.0 dir=1.0\n"
    );
}

#[test]
fn kcode_line_needs_no_placement() {
    let mut table = ValueTable::new();
    table.add_variable("kcLine", "1000 1.0 5 50");
    let mut model = SourceModel::new(SourceKind::KCode, "kc");
    model.populate(&table).expect("populate");
    assert_eq!(
        model.write(TargetCode::Mcnp).expect("kcode"),
        "kcode 1000 1 5 50\n"
    );
}

#[test]
fn phits_and_fluka_decks_for_a_linked_beam() {
    let frame = FixedFrame::world("Target").with_link(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
    let mut model = SourceModel::new(SourceKind::Beam, "bm");
    model
        .create_all(&ValueTable::new(), &frame, LinkIndex(1))
        .expect("placed on link 1");

    let phits = model.write(TargetCode::Phits).expect("phits");
    assert!(phits.starts_with("[source]\n"));
    assert!(phits.contains("[transform]"));

    let fluka = model.write(TargetCode::Fluka).expect("fluka");
    assert!(fluka.starts_with("BEAM"));
    assert!(fluka.contains("BEAMPOS"));
}

#[test]
fn registry_rejects_duplicates_and_writes_matching_sources() {
    let mut context = BuildContext::new();
    context
        .insert(build(SourceKind::Point, "ptA", &ValueTable::new()))
        .expect("first");
    context
        .insert(build(SourceKind::Point, "ptB", &ValueTable::new()))
        .expect("second");
    let error = context
        .insert(build(SourceKind::Beam, "ptA", &ValueTable::new()))
        .expect_err("duplicate name");
    assert_eq!(error.category(), SourceErrorCategory::ValidationError);

    assert_eq!(context.names_matching("pt?").expect("glob"), vec!["ptA", "ptB"]);
    let deck = context.write_deck(TargetCode::Mcnp).expect("deck");
    assert_eq!(deck.lines().count(), 2);

    let fluka = context
        .write_matching(TargetCode::Fluka, "ptB")
        .expect("fluka deck");
    assert_eq!(fluka.matches("BEAM ").count(), 1);
}
