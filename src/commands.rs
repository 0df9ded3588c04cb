/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "add-row",
    aliases: &["ar", "new", "row"],
    description: "Add a row to the current group",
  },
  Command {
    name: "add-column",
    aliases: &["ac", "column"],
    description: "Append a column",
  },
  Command {
    name: "rename-column",
    aliases: &["rc", "rename"],
    description: "Rename a column",
  },
  Command {
    name: "delete-column",
    aliases: &["dc", "drop"],
    description: "Delete a column",
  },
  Command {
    name: "group-by",
    aliases: &["g", "group"],
    description: "Choose the grouping column",
  },
  Command {
    name: "comment",
    aliases: &["note"],
    description: "Edit the selected group's comment",
  },
  Command {
    name: "export",
    aliases: &["save", "x"],
    description: "Write the table to a JSON file",
  },
  Command {
    name: "import",
    aliases: &["load", "i"],
    description: "Replace the table from a JSON file",
  },
  Command {
    name: "reset",
    aliases: &["clear"],
    description: "Delete local data and reload the seed",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit invtab",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Stable sort keeps table order within a priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
