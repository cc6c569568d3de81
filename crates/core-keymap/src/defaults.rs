//! Builtin command set.
//!
//! Names are host command names; the engine never interprets them beyond the
//! kind, flags, input kind and entered mode registered here.

use crate::command::{CommandFlags, CommandSpec, Internal};
use crate::table::{Binding, KeymapError, KeymapsBuilder};
use core_state::{Mode, ModeSet};

const MOTION: ModeSet = ModeSet::MOTION;
const NORMAL: ModeSet = ModeSet::NORMAL;
const ANY_VISUAL: ModeSet = ModeSet::ANY_VISUAL;
const NV: ModeSet = ModeSet::NORMAL.union(ModeSet::ANY_VISUAL);
const OBJECTS: ModeSet = ModeSet::OPERATOR_PENDING.union(ModeSet::ANY_VISUAL);
const INSERT: ModeSet = ModeSet::INSERT_LIKE;
const ESCAPE: &[&str] = &["<esc>", "<C-[>", "<C-c>"];

fn horizontal(name: &str) -> CommandSpec {
    CommandSpec::motion(name).with_flags(CommandFlags::UPDATES_XPOS)
}

fn edit(name: &str) -> CommandSpec {
    CommandSpec::operator(name).repeatable()
}

pub(crate) fn register(b: &mut KeymapsBuilder) -> Result<(), KeymapError> {
    motions(b)?;
    text_objects(b)?;
    operators(b)?;
    normal(b)?;
    visual(b)?;
    insert(b)?;
    command_line(b)?;
    Ok(())
}

fn motions(b: &mut KeymapsBuilder) -> Result<(), KeymapError> {
    b.command(MOTION, &["h", "<left>", "<bs>"], horizontal("move_left"))?
        .command(MOTION, &["l", "<right>", "<space>"], horizontal("move_right"))?
        .command(MOTION, &["j", "<down>", "<C-n>", "<C-j>"], CommandSpec::motion("move_down"))?
        .command(MOTION, &["k", "<up>", "<C-p>"], CommandSpec::motion("move_up"))?
        .command(MOTION, &["gj"], CommandSpec::motion("move_display_down"))?
        .command(MOTION, &["gk"], CommandSpec::motion("move_display_up"))?
        .command(MOTION, &["w"], horizontal("word_forward"))?
        .command(MOTION, &["W"], horizontal("bigword_forward"))?
        .command(MOTION, &["b"], horizontal("word_backward"))?
        .command(MOTION, &["B"], horizontal("bigword_backward"))?
        .command(MOTION, &["e"], horizontal("word_end"))?
        .command(MOTION, &["E"], horizontal("bigword_end"))?
        .command(MOTION, &["ge"], horizontal("word_end_backward"))?
        .command(MOTION, &["gE"], horizontal("bigword_end_backward"))?
        .command(MOTION, &["0", "<home>"], horizontal("line_start"))?
        .command(MOTION, &["^"], horizontal("first_non_blank"))?
        .command(MOTION, &["$", "<end>"], horizontal("line_end"))?
        .command(MOTION, &["g_"], horizontal("last_non_blank"))?
        .command(MOTION, &["<bar>"], horizontal("goto_column"))?
        .command(MOTION, &["gg"], CommandSpec::motion("goto_first_line"))?
        .command(MOTION, &["G"], CommandSpec::motion("goto_line"))?
        .command(MOTION, &["f"], horizontal("find_char_forward").char_input("char"))?
        .command(MOTION, &["F"], horizontal("find_char_backward").char_input("char"))?
        .command(MOTION, &["t"], horizontal("till_char_forward").char_input("char"))?
        .command(MOTION, &["T"], horizontal("till_char_backward").char_input("char"))?
        .command(MOTION, &[";"], horizontal("repeat_find"))?
        .command(MOTION, &[","], horizontal("repeat_find_reverse"))?
        .command(MOTION, &["%"], horizontal("match_pair"))?
        .command(MOTION, &["}"], CommandSpec::motion("paragraph_forward"))?
        .command(MOTION, &["{"], CommandSpec::motion("paragraph_backward"))?
        .command(MOTION, &[")"], horizontal("sentence_forward"))?
        .command(MOTION, &["("], horizontal("sentence_backward"))?
        .command(MOTION, &["/"], horizontal("search_forward").line_input("pattern"))?
        .command(MOTION, &["?"], horizontal("search_backward").line_input("pattern"))?
        .command(MOTION, &["n"], horizontal("search_next"))?
        .command(MOTION, &["N"], horizontal("search_previous"))?
        .command(MOTION, &["*"], horizontal("search_word_forward"))?
        .command(MOTION, &["#"], horizontal("search_word_backward"))?
        .command(MOTION, &["H"], CommandSpec::motion("screen_top"))?
        .command(MOTION, &["M"], CommandSpec::motion("screen_middle"))?
        .command(MOTION, &["L"], CommandSpec::motion("screen_bottom"))?
        .command(MOTION, &["`"], horizontal("goto_mark").char_input("mark"))?
        .command(MOTION, &["'"], CommandSpec::motion("goto_mark_line").char_input("mark"))?
        .command(NV, &["<C-d>"], CommandSpec::motion("scroll_half_page_down"))?
        .command(NV, &["<C-u>"], CommandSpec::motion("scroll_half_page_up"))?
        .command(NV, &["<C-f>", "<pagedown>"], CommandSpec::motion("page_down"))?
        .command(NV, &["<C-b>", "<pageup>"], CommandSpec::motion("page_up"))?;
    Ok(())
}

fn text_objects(b: &mut KeymapsBuilder) -> Result<(), KeymapError> {
    const OBJECT_KEYS: &[(&[&str], &str)] = &[
        (&["w"], "word"),
        (&["W"], "bigword"),
        (&["s"], "sentence"),
        (&["p"], "paragraph"),
        (&["(", ")", "b"], "parens"),
        (&["{", "}", "B"], "braces"),
        (&["[", "]"], "brackets"),
        (&["<lt>", ">"], "angle_brackets"),
        (&["\""], "double_quotes"),
        (&["'"], "single_quotes"),
        (&["`"], "backticks"),
        (&["t"], "tag"),
    ];
    for (prefix, inner) in [("i", true), ("a", false)] {
        for (suffixes, object) in OBJECT_KEYS {
            let keys: Vec<String> = suffixes.iter().map(|s| format!("{prefix}{s}")).collect();
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            b.command(
                OBJECTS,
                &keys,
                CommandSpec::motion("select_text_object")
                    .without_flags(CommandFlags::SCROLL_INTO_VIEW)
                    .preset("object", *object)
                    .preset("inner", inner),
            )?;
        }
    }
    Ok(())
}

fn operators(b: &mut KeymapsBuilder) -> Result<(), KeymapError> {
    let ops: &[(&str, &str, &str)] = &[
        ("d", "dd", "delete"),
        ("c", "cc", "change"),
        (">", ">>", "indent"),
        ("<lt>", "<lt><lt>", "unindent"),
        ("=", "==", "reindent"),
        ("gu", "guu", "lowercase"),
        ("gU", "gUU", "uppercase"),
        ("g~", "g~~", "toggle_case"),
        ("gq", "gqq", "format"),
        ("g?", "g??", "rot13"),
    ];
    for (key, linewise, name) in ops {
        let mut op = edit(name).motion_required();
        let mut line = edit(name).preset("linewise", true);
        if *name == "change" {
            op = op.enters(Mode::Insert);
            line = line.enters(Mode::Insert);
        }
        let mut line_keys = vec![*linewise];
        let doubled = format!("{key}{key}");
        if key.starts_with('g') {
            line_keys.push(&doubled);
        }
        if *name == "change" {
            line_keys.push("S");
        }
        b.command(NV, &[*key], op)?.command(NORMAL, &line_keys, line)?;
    }
    b.command(NV, &["y"], CommandSpec::operator("yank").motion_required())?
        .command(
            NORMAL,
            &["yy", "Y"],
            CommandSpec::operator("yank").preset("linewise", true),
        )?;
    Ok(())
}

fn normal(b: &mut KeymapsBuilder) -> Result<(), KeymapError> {
    let inserting = |name: &str| edit(name).enters(Mode::Insert);
    let op = CommandSpec::operator;
    let scroll = |position: &str| op("scroll_cursor").preset("position", position);
    let scroll_lines = |direction: &str| op("scroll_lines").preset("direction", direction);
    let focus = |direction: &str| op("focus_window").preset("direction", direction);
    let split = |vertical: bool| op("split_window").preset("vertical", vertical);
    b.command(NORMAL, &["x", "<del>"], edit("delete_char"))?
        .command(NORMAL, &["X"], edit("delete_char_before"))?
        .command(NORMAL, &["D"], edit("delete_to_eol"))?
        .command(NORMAL, &["C"], inserting("change_to_eol"))?
        .command(NORMAL, &["s"], inserting("substitute_char"))?
        .command(NORMAL, &["p"], edit("paste_after"))?
        .command(NORMAL, &["P"], edit("paste_before"))?
        .command(NORMAL, &["u"], op("undo"))?
        .command(NORMAL, &["<C-r>"], op("redo"))?
        .command(NORMAL, &["U"], op("undo_line"))?
        .command(NORMAL, &["i", "<insert>"], inserting("enter_insert"))?
        .command(NORMAL, &["a"], inserting("append"))?
        .command(NORMAL, &["I"], inserting("insert_at_first_non_blank"))?
        .command(NORMAL, &["A"], inserting("append_at_eol"))?
        .command(NORMAL, &["o"], inserting("open_line_below"))?
        .command(NORMAL, &["O"], inserting("open_line_above"))?
        .command(NORMAL, &["R"], edit("enter_replace").enters(Mode::Replace))?
        .command(NORMAL, &["v"], op("enter_visual").enters(Mode::Visual))?
        .command(NORMAL, &["V"], op("enter_visual_line").enters(Mode::VisualLine))?
        .command(NORMAL, &["<C-v>"], op("enter_visual_block").enters(Mode::VisualBlock))?
        .command(NORMAL, &["gv"], op("reselect_visual").enters(Mode::Visual))?
        .command(NORMAL, &["r"], edit("replace_char").char_input("char"))?
        .command(NORMAL, &["J"], edit("join_lines"))?
        .command(NORMAL, &["gJ"], edit("join_lines").preset("spaces", false))?
        .command(NORMAL, &["~"], edit("toggle_case_char"))?
        .command(NORMAL, &["<C-a>"], edit("increment"))?
        .command(NORMAL, &["<C-x>"], edit("decrement"))?
        .command(NORMAL, &["m"], op("set_mark").char_input("mark"))?
        .command(NORMAL, &["zz"], scroll("center"))?
        .command(NORMAL, &["zt"], scroll("top"))?
        .command(NORMAL, &["zb"], scroll("bottom"))?
        .command(NORMAL, &["<C-e>"], scroll_lines("down"))?
        .command(NORMAL, &["<C-y>"], scroll_lines("up"))?
        .command(NORMAL, &["<C-w>h", "<C-w><left>"], focus("left"))?
        .command(NORMAL, &["<C-w>j", "<C-w><down>"], focus("down"))?
        .command(NORMAL, &["<C-w>k", "<C-w><up>"], focus("up"))?
        .command(NORMAL, &["<C-w>l", "<C-w><right>"], focus("right"))?
        .command(NORMAL, &["<C-w>w", "<C-w><C-w>"], focus("next"))?
        .command(NORMAL, &["<C-w>s"], split(false))?
        .command(NORMAL, &["<C-w>v"], split(true))?
        .command(NORMAL, &["<C-w>c", "<C-w>q"], op("close_window"))?
        .command(NORMAL, &["<C-w>o"], op("only_window"))?
        .command(NORMAL, &["<C-g>"], op("show_file_info"))?
        .command(NV, &[":"], op("enter_command_line").enters(Mode::Command))?
        .command(NORMAL, &["."], op("repeat").internal(Internal::RepeatLast))?
        .command(
            NORMAL,
            &["q"],
            op("toggle_macro")
                .char_input("register")
                .internal(Internal::ToggleMacro),
        )?
        .command(
            NORMAL,
            &["@"],
            op("replay_macro")
                .char_input("register")
                .internal(Internal::ReplayMacro),
        )?
        .binding(NV, "\"", Binding::OpenRegister)?;
    Ok(())
}

fn visual(b: &mut KeymapsBuilder) -> Result<(), KeymapError> {
    let exit = || CommandSpec::operator("exit_visual").enters(Mode::Normal);
    b.command(ANY_VISUAL, &["x", "<del>"], edit("delete").motion_required())?
        .command(ANY_VISUAL, &["s"], edit("change").motion_required().enters(Mode::Insert))?
        .command(ANY_VISUAL, &["~"], edit("toggle_case").motion_required())?
        .command(ANY_VISUAL, &["u"], edit("lowercase").motion_required())?
        .command(ANY_VISUAL, &["U"], edit("uppercase").motion_required())?
        .command(ANY_VISUAL, &["J"], edit("join_lines"))?
        .command(ANY_VISUAL, &["r"], edit("replace_char").char_input("char"))?
        .command(ANY_VISUAL, &["p", "P"], edit("paste_after"))?
        .command(ANY_VISUAL, &["o", "O"], CommandSpec::motion("swap_selection_ends"))?
        .command(ANY_VISUAL, ESCAPE, exit())?
        .command(ModeSet::VISUAL, &["v"], exit())?
        .command(ModeSet::VISUAL_LINE, &["V"], exit())?
        .command(ModeSet::VISUAL_BLOCK, &["<C-v>"], exit())?
        .command(
            ModeSet::VISUAL_LINE | ModeSet::VISUAL_BLOCK,
            &["v"],
            CommandSpec::operator("enter_visual").enters(Mode::Visual),
        )?
        .command(
            ModeSet::VISUAL | ModeSet::VISUAL_BLOCK,
            &["V"],
            CommandSpec::operator("enter_visual_line").enters(Mode::VisualLine),
        )?
        .command(
            ModeSet::VISUAL | ModeSet::VISUAL_LINE,
            &["<C-v>"],
            CommandSpec::operator("enter_visual_block").enters(Mode::VisualBlock),
        )?;
    Ok(())
}

fn insert(b: &mut KeymapsBuilder) -> Result<(), KeymapError> {
    b.command(INSERT, ESCAPE, CommandSpec::operator("exit_insert").enters(Mode::Normal))?
        .command(INSERT, &[], edit("insert").with_flags(CommandFlags::GLUE_UNDO))?
        .command(INSERT, &["<cr>"], edit("insert_newline").with_flags(CommandFlags::GLUE_UNDO))?
        .command(INSERT, &["<tab>"], edit("insert_tab").with_flags(CommandFlags::GLUE_UNDO))?
        .command(INSERT, &["<bs>"], edit("delete_char_before").with_flags(CommandFlags::GLUE_UNDO))?
        .command(INSERT, &["<del>"], edit("delete_char").with_flags(CommandFlags::GLUE_UNDO))?
        .command(INSERT, &["<C-w>"], edit("delete_word_before"))?
        .command(INSERT, &["<C-u>"], edit("delete_to_line_start"))?
        .command(INSERT, &["<C-t>"], edit("indent").preset("linewise", true))?
        .command(INSERT, &["<C-d>"], edit("unindent").preset("linewise", true))?
        .command(
            INSERT,
            &["<C-r>"],
            CommandSpec::operator("paste_register").char_input("register"),
        )?
        .command(INSERT, &["<left>"], horizontal("move_left"))?
        .command(INSERT, &["<right>"], horizontal("move_right"))?
        .command(INSERT, &["<up>"], CommandSpec::motion("move_up"))?
        .command(INSERT, &["<down>"], CommandSpec::motion("move_down"))?;
    Ok(())
}

fn command_line(b: &mut KeymapsBuilder) -> Result<(), KeymapError> {
    b.command(
        ModeSet::COMMAND,
        ESCAPE,
        CommandSpec::operator("exit_command_line").enters(Mode::Normal),
    )?
    .command(
        ModeSet::COMMAND,
        &["<cr>"],
        CommandSpec::operator("execute_command_line").enters(Mode::Normal),
    )?
    .command(ModeSet::COMMAND, &[], CommandSpec::operator("insert"))?;
    Ok(())
}
