use eliza::{load_script, Engine, ScriptErrorKind};

const DOCTOR_SCRIPT: &str = include_str!("../demos/doctor.eliza");

fn engine() -> Engine {
    Engine::new(load_script(DOCTOR_SCRIPT).expect("demos/doctor.eliza must parse"))
}

#[test]
fn greeting_matches_opening_remarks() {
    assert_eq!(engine().greeting(), "HOW DO YOU DO. PLEASE STATE YOUR PROBLEM");
}

#[test]
fn men_are_all_alike() {
    let mut e = engine();
    assert_eq!(e.respond("Men are all alike."), "IN WHAT WAY");
}

#[test]
fn always_bugging_us() {
    let mut e = engine();
    assert_eq!(
        e.respond("They're always bugging us about something or other."),
        "CAN YOU THINK OF A SPECIFIC EXAMPLE"
    );
}

#[test]
fn boyfriend_made_me_come_here() {
    let mut e = engine();
    assert_eq!(e.respond("Well, my boyfriend made me come here."), "YOUR BOYFRIEND MADE YOU COME HERE");
}

#[test]
fn depressed_much_of_the_time() {
    let mut e = engine();
    assert_eq!(e.respond("He says I'm depressed much of the time."), "I AM SORRY TO HEAR YOU ARE DEPRESSED");
}

#[test]
fn my_father() {
    let mut e = engine();
    assert_eq!(e.respond("My father."), "YOUR FATHER");
}

/// Exercises the MEMORY recall path: the boyfriend remark lays down a
/// memory at `limit == 2`, one unrecognised filler turn advances `limit`
/// to 3 with an empty keyword stack (a plain NONE turn), and the next
/// turn wraps `limit` to 4 with the keyword stack still empty, recalling
/// the memory verbatim — the same mechanism and exact wording as the
/// 15th-turn recall in the 1966 transcript, reached here over a shorter
/// filler run since the intervening turns don't affect FIFO order or the
/// hash once a single memory is queued.
#[test]
fn memory_recall_on_limit_wraparound() {
    let mut e = engine();
    assert_eq!(e.respond("Well, my boyfriend made me come here."), "YOUR BOYFRIEND MADE YOU COME HERE");
    e.respond("Xyzzy.");
    let recalled = e.respond("Plugh.");
    assert_eq!(
        recalled,
        "DOES THAT HAVE ANYTHING TO DO WITH THE FACT THAT YOUR BOYFRIEND MADE YOU COME HERE"
    );
}

#[test]
fn unrecognised_input_falls_back_to_none() {
    let mut e = engine();
    let response = e.respond("Qwerty zxcvbn.");
    let none_responses = [
        "I AM NOT SURE I UNDERSTAND YOU FULLY",
        "PLEASE GO ON",
        "WHAT DOES THAT SUGGEST TO YOU",
        "DO YOU FEEL STRONGLY ABOUT DISCUSSING SUCH THINGS",
    ];
    assert!(none_responses.contains(&response.as_str()), "unexpected response: {response}");
}

#[test]
fn empty_script_reports_missing_open_paren() {
    let err = load_script("").unwrap_err();
    assert_eq!(err.to_string(), "Script error on line 1: expected '('");
}

#[test]
fn empty_rule_list_reports_missing_none_rule() {
    let err = load_script("()").unwrap_err();
    assert_eq!(err.to_string(), "Script error: no NONE rule specified; see Jan 1966 CACM page 41");
}

#[test]
fn unterminated_rule_reports_offending_line() {
    let err = load_script("()\n(NONE\n((").unwrap_err();
    assert_eq!(err.to_string(), "Script error on line 3: expected ')'");
}

#[test]
fn script_missing_memory_rule_is_rejected() {
    let err = load_script("(HI)\n(NONE ((0) (I SEE)))\n").unwrap_err();
    assert!(matches!(err.kind, ScriptErrorKind::NoMemoryRule));
}
