//! Canned example programs shown in the sidebar. Selecting one replaces the
//! editor buffer wholesale.

pub struct Snippet {
    pub name: &'static str,
    pub code: &'static str,
}

pub const WELCOME: &str = "print('Welcome to pyground!')\n\n# Try writing some Python here\nfor i in range(5):\n    print(f'Iteration {i + 1}')";

pub const SNIPPETS: &[Snippet] = &[
    Snippet {
        name: "Hello World",
        code: "print('Hello, Python World!')\n\nname = 'User'\nprint(f'Greetings, {name}!')",
    },
    Snippet {
        name: "Lists & Loops",
        code: "fruits = ['apple', 'banana', 'cherry']\n\nfor index, fruit in enumerate(fruits):\n    print(f\"{index + 1}: {fruit.capitalize()}\")\n\n# List comprehension\nsquares = [x**2 for x in range(10)]\nprint('Squares:', squares)",
    },
    Snippet {
        name: "Data Structures",
        code: "person = {\n    'name': 'Alice',\n    'age': 30,\n    'skills': ['Python', 'Data Science', 'Rust'],\n}\n\nprint(f\"Name: {person['name']}\")\nprint(f\"Top Skill: {person['skills'][0]}\")",
    },
    Snippet {
        name: "Fibonacci Sequence",
        code: "def fibonacci(n):\n    a, b = 0, 1\n    result = []\n    while a < n:\n        result.append(a)\n        a, b = b, a + b\n    return result\n\nprint(fibonacci(100))",
    },
    Snippet {
        name: "Error Handling",
        code: "try:\n    x = 10 / 0\nexcept ZeroDivisionError as e:\n    print(f\"Caught error: {e}\")\nfinally:\n    print(\"Execution completed.\")",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippets_are_named_and_nonempty() {
        assert!(!SNIPPETS.is_empty());
        for s in SNIPPETS {
            assert!(!s.name.is_empty());
            assert!(!s.code.trim().is_empty());
        }
    }
}
